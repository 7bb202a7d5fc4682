use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use drivex_http::HttpRemoteStore;
use drivex_sdk::{
    folder_from, name_from, Drive, Node, NodeView, SearchFilter, SearchTerms, UploadRequest,
};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::cli::{AboutArgs, CatArgs, Cli, Command, LsArgs, OutputFormat, UploadArgs};
use crate::config::CliConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let store = HttpRemoteStore::new(&config.http.with_env()).context("Failed to build client")?;
    let mut drive = Drive::new(Arc::new(store), config.drive);
    if cli.app_data {
        drive = drive.app_data();
    }
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&drive, cli.command, cli.format, &mut out).await
}

/// Run one subcommand against `drive`, writing results to `out`.
pub async fn execute<W: Write>(
    drive: &Drive,
    command: Command,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Find(args) => cmd_find(drive, &args.path, format, out).await,
        Command::Mkpath(args) => cmd_mkpath(drive, &args.path, format, out).await,
        Command::Ls(args) => cmd_ls(drive, args, format, out).await,
        Command::Upload(args) => cmd_upload(drive, args, format, out).await,
        Command::Cat(args) => cmd_cat(drive, args, out).await,
        Command::Rm(args) => cmd_rm(drive, &args.path, format, out).await,
        Command::About(args) => cmd_about(drive, args, format, out).await,
    }
}

async fn cmd_find<W: Write>(
    drive: &Drive,
    path: &str,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    let node = drive.find_path(path).await?;
    match format {
        OutputFormat::Json => write_json(out, &NodeView::new(&node)),
        OutputFormat::Text => {
            writeln!(out, "{}", node_line(&node))?;
            if let Some(time) = node.modified_time {
                writeln!(out, "  modified: {}", time.to_rfc3339())?;
            }
            if let Some(size) = node.size {
                writeln!(out, "  size:     {size}")?;
            }
            Ok(())
        }
    }
}

async fn cmd_mkpath<W: Write>(
    drive: &Drive,
    path: &str,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    let folder = drive.create_path(path).await?;
    let created = folder.node().is_some_and(|n| n.is_new);
    match format {
        OutputFormat::Json => write_json(out, &json!({ "id": folder.id(), "created": created })),
        OutputFormat::Text => {
            let status = if created { "created" } else { "exists" };
            writeln!(out, "{} {} {} ({status})", "✓".green().bold(), path, folder.id())?;
            Ok(())
        }
    }
}

async fn cmd_ls<W: Write>(
    drive: &Drive,
    args: LsArgs,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    let folder = drive.resolve_path(&args.path).await?;
    if folder.node().is_some_and(|n| !n.is_folder()) {
        bail!("{} is not a folder", args.path);
    }
    let mut filter = SearchFilter::new(SearchTerms::default()).limit(args.limit);
    if args.folders {
        filter = filter.folders();
    } else if args.files {
        filter = filter.files();
    }
    let result = drive
        .search(&filter, Some(&folder), args.name.as_deref())
        .await?;
    if result.len() >= filter.page_size() {
        warn!(limit = filter.page_size(), "listing may be truncated");
    }
    match format {
        OutputFormat::Json => {
            let views: Vec<NodeView<'_>> = result.files.iter().map(NodeView::new).collect();
            write_json(out, &views)
        }
        OutputFormat::Text => {
            for node in &result.files {
                writeln!(out, "{}", node_line(node))?;
            }
            Ok(())
        }
    }
}

async fn cmd_upload<W: Write>(
    drive: &Drive,
    args: UploadArgs,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    let (folder, name) = split_remote(&args.remote, &args.local)?;
    let mime = args.mime.unwrap_or_else(|| {
        mime_guess::from_path(&args.local)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });
    let file = tokio::fs::File::open(&args.local)
        .await
        .with_context(|| format!("Failed to open {}", args.local.display()))?;
    debug!(%folder, %name, %mime, "uploading");

    let request = UploadRequest::new(name, mime, ReaderStream::new(file).boxed())
        .to_path(folder)
        .create_path(args.create_path)
        .clobber(args.clobber);
    let node = drive.upload(request).await?;
    match format {
        OutputFormat::Json => write_json(out, &NodeView::new(&node)),
        OutputFormat::Text => {
            writeln!(out, "{} Uploaded {} ({})", "✓".green().bold(), node.name, node.id)?;
            Ok(())
        }
    }
}

async fn cmd_cat<W: Write>(drive: &Drive, args: CatArgs, out: &mut W) -> anyhow::Result<()> {
    let mut stream = drive
        .download(&args.path, args.export_mime.as_deref())
        .await?;
    while let Some(chunk) = stream
        .try_next()
        .await
        .with_context(|| format!("Failed to read {}", args.path))?
    {
        out.write_all(&chunk)?;
    }
    out.flush()?;
    Ok(())
}

async fn cmd_rm<W: Write>(
    drive: &Drive,
    path: &str,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    if name_from(path).is_none() {
        bail!("Refusing to remove the root folder");
    }
    let node = drive.find_path(path).await?;
    let removed = drive.remove(&node).await?;
    match format {
        OutputFormat::Json => write_json(out, &json!({ "id": node.id, "removed": removed })),
        OutputFormat::Text => {
            writeln!(out, "{} Removed {} ({})", "✓".green().bold(), path, node.id)?;
            Ok(())
        }
    }
}

async fn cmd_about<W: Write>(
    drive: &Drive,
    args: AboutArgs,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    if args.hexid {
        let id = drive.hexid().await?;
        return match format {
            OutputFormat::Json => write_json(out, &json!({ "hexid": id })),
            OutputFormat::Text => {
                writeln!(out, "{id}")?;
                Ok(())
            }
        };
    }
    let about = drive.about_me(args.fields.as_deref()).await?;
    write_json(out, &about)
}

/// Split a remote destination into folder path and file name. A trailing
/// `/` or an empty path keeps the local file name.
fn split_remote(remote: &str, local: &Path) -> anyhow::Result<(String, String)> {
    if remote.ends_with('/') || name_from(remote).is_none() {
        let name = local
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{} has no usable file name", local.display()))?;
        let folder = if remote.is_empty() { "/" } else { remote };
        return Ok((folder.to_string(), name.to_string()));
    }
    let name = name_from(remote).unwrap_or_default();
    Ok((folder_from(remote), name.to_string()))
}

fn node_line(node: &Node) -> String {
    if node.is_folder() {
        format!("{}  {}/", node.id.dimmed(), node.name.blue().bold())
    } else {
        format!("{}  {}", node.id.dimmed(), node.name)
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
