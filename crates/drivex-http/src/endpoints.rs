use drivex_store::ListRequest;
use reqwest::Url;

use crate::error::{HttpError, HttpResult};

/// Path segments under the API base.
pub mod paths {
    pub const FILES: &str = "files";
    pub const ABOUT: &str = "about";
    pub const EXPORT: &str = "export";
}

/// Builds request URLs from the configured bases.
#[derive(Clone, Debug)]
pub struct Endpoints {
    api: Url,
    upload: Url,
}

impl Endpoints {
    pub fn new(api_base: &str, upload_base: &str) -> HttpResult<Self> {
        Ok(Self {
            api: parse_base(api_base)?,
            upload: parse_base(upload_base)?,
        })
    }

    pub fn files(&self) -> Url {
        join(&self.api, &[paths::FILES])
    }

    pub fn file(&self, id: &str) -> Url {
        join(&self.api, &[paths::FILES, id])
    }

    pub fn export(&self, id: &str) -> Url {
        join(&self.api, &[paths::FILES, id, paths::EXPORT])
    }

    pub fn about(&self) -> Url {
        join(&self.api, &[paths::ABOUT])
    }

    pub fn upload_files(&self) -> Url {
        join(&self.upload, &[paths::FILES])
    }
}

fn parse_base(base: &str) -> HttpResult<Url> {
    let url = Url::parse(base).map_err(|e| HttpError::InvalidUrl {
        url: base.to_string(),
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(HttpError::InvalidUrl {
            url: base.to_string(),
            message: "not a base URL".into(),
        });
    }
    Ok(url)
}

fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Query parameters for a list call. Fields are wrapped as `files(...)`.
pub fn list_params(request: &ListRequest) -> Vec<(&'static str, String)> {
    vec![
        ("q", request.query.clone()),
        ("fields", format!("files({})", request.fields)),
        ("pageSize", request.page_size.to_string()),
        ("orderBy", request.order_by.clone()),
        ("spaces", request.spaces.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new(
            "https://www.googleapis.com/drive/v3",
            "https://www.googleapis.com/upload/drive/v3/",
        )
        .unwrap()
    }

    #[test]
    fn file_urls() {
        let e = endpoints();
        assert_eq!(e.files().as_str(), "https://www.googleapis.com/drive/v3/files");
        assert_eq!(
            e.file("abc").as_str(),
            "https://www.googleapis.com/drive/v3/files/abc"
        );
        assert_eq!(
            e.export("abc").as_str(),
            "https://www.googleapis.com/drive/v3/files/abc/export"
        );
        assert_eq!(e.about().as_str(), "https://www.googleapis.com/drive/v3/about");
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        assert_eq!(
            endpoints().upload_files().as_str(),
            "https://www.googleapis.com/upload/drive/v3/files"
        );
    }

    #[test]
    fn ids_are_escaped() {
        let url = endpoints().file("a/b c");
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/drive/v3/files/a%2Fb%20c"
        );
    }

    #[test]
    fn bad_base_is_rejected() {
        let err = Endpoints::new("not a url", "https://x").unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
        assert!(Endpoints::new("mailto:a@b", "https://x").is_err());
    }

    #[test]
    fn list_params_wrap_fields() {
        let req = ListRequest {
            query: "name='x' and trashed=false".into(),
            fields: "id,name".into(),
            page_size: 2,
            order_by: "modifiedTime desc".into(),
            spaces: "drive".into(),
        };
        let params = list_params(&req);
        assert!(params.contains(&("fields", "files(id,name)".to_string())));
        assert!(params.contains(&("pageSize", "2".to_string())));
        assert!(params.contains(&("q", req.query.clone())));
    }
}
