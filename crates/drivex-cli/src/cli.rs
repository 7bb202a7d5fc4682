use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "drivex",
    about = "Path-addressed access to a remote drive",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with [http] and [drive] sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Work in the application data space instead of the main drive
    #[arg(long, global = true)]
    pub app_data: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the node at a path
    Find(PathArgs),
    /// Create a folder path, including missing parents
    Mkpath(PathArgs),
    /// List the contents of a folder
    Ls(LsArgs),
    /// Upload a local file
    Upload(UploadArgs),
    /// Print the content of a file
    Cat(CatArgs),
    /// Delete the node at a path
    Rm(PathArgs),
    /// Show account information
    About(AboutArgs),
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(default_value = "/")]
    pub path: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, conflicts_with = "files")]
    pub folders: bool,
    #[arg(long)]
    pub files: bool,
    #[arg(short = 'n', long, default_value = "1000")]
    pub limit: usize,
}

#[derive(Args)]
pub struct UploadArgs {
    pub local: PathBuf,
    /// Destination file path; a trailing `/` keeps the local file name
    pub remote: String,
    #[arg(long)]
    pub mime: Option<String>,
    #[arg(short = 'p', long)]
    pub create_path: bool,
    #[arg(long)]
    pub clobber: bool,
}

#[derive(Args)]
pub struct CatArgs {
    pub path: String,
    /// MIME type to export store-native documents to
    #[arg(long)]
    pub export_mime: Option<String>,
}

#[derive(Args)]
pub struct AboutArgs {
    #[arg(long)]
    pub fields: Option<String>,
    /// Print the salted account identifier instead
    #[arg(long)]
    pub hexid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_find() {
        let cli = Cli::try_parse_from(["drivex", "find", "/a/b"]).unwrap();
        if let Command::Find(args) = cli.command {
            assert_eq!(args.path, "/a/b");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_ls_defaults() {
        let cli = Cli::try_parse_from(["drivex", "ls"]).unwrap();
        if let Command::Ls(args) = cli.command {
            assert_eq!(args.path, "/");
            assert_eq!(args.limit, 1000);
            assert!(!args.folders && !args.files);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_ls_filters() {
        let cli = Cli::try_parse_from(["drivex", "ls", "docs", "--folders", "-n", "5", "--name", "x"]).unwrap();
        if let Command::Ls(args) = cli.command {
            assert!(args.folders);
            assert_eq!(args.limit, 5);
            assert_eq!(args.name, Some("x".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn ls_folders_and_files_conflict() {
        assert!(Cli::try_parse_from(["drivex", "ls", "--folders", "--files"]).is_err());
    }

    #[test]
    fn parse_upload() {
        let cli = Cli::try_parse_from([
            "drivex", "upload", "r.txt", "/a/b/", "-p", "--clobber", "--mime", "text/plain",
        ])
        .unwrap();
        if let Command::Upload(args) = cli.command {
            assert_eq!(args.local, PathBuf::from("r.txt"));
            assert_eq!(args.remote, "/a/b/");
            assert!(args.create_path);
            assert!(args.clobber);
            assert_eq!(args.mime, Some("text/plain".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_cat_export() {
        let cli = Cli::try_parse_from(["drivex", "cat", "notes", "--export-mime", "text/plain"]).unwrap();
        if let Command::Cat(args) = cli.command {
            assert_eq!(args.export_mime, Some("text/plain".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn upload_needs_both_paths() {
        assert!(Cli::try_parse_from(["drivex", "upload", "r.txt"]).is_err());
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "drivex", "about", "--verbose", "--format", "json", "--app-data", "-c", "d.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.app_data);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("d.toml")));
        assert!(matches!(cli.command, Command::About(_)));
    }

    #[test]
    fn parse_rm() {
        let cli = Cli::try_parse_from(["drivex", "rm", "old.txt"]).unwrap();
        assert!(matches!(cli.command, Command::Rm(_)));
    }
}
