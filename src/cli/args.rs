use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tfbackend::credentials::{CredentialParams, DEFAULT_PROFILE, DEFAULT_REGION};
use tfbackend::error::BackendError;
use tfbackend::module::{Flavor, ModuleParams};
use tfbackend::output::OutputFormat;

/// Invoked as `tfbackend <ARGS_FILE>` by Ansible, or with a subcommand by hand.
#[derive(Parser, Debug)]
#[command(author, version, about, arg_required_else_help = true)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    /// Ansible arguments file; runs in module mode when no subcommand is given
    #[arg(value_name = "ARGS_FILE")]
    pub args_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch state outputs, returned under `vars`
    Fetch(FetchArgs),
    /// Fetch state outputs, returned under `meta`
    S3(S3Args),
    /// Run as an Ansible binary module reading an arguments file
    Module(ModuleArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    #[arg(long)]
    pub bucket: String,

    #[arg(long)]
    pub object: String,

    #[command(flatten)]
    pub aws: AwsArgs,
}

#[derive(clap::Args, Debug)]
pub struct S3Args {
    #[arg(long)]
    pub bucket: String,

    #[arg(long)]
    pub key: String,

    #[command(flatten)]
    pub aws: AwsArgs,
}

#[derive(clap::Args, Debug)]
pub struct AwsArgs {
    #[arg(long, env = "AWS_PROFILE", default_value = DEFAULT_PROFILE)]
    pub aws_profile: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", default_value = "", hide_env_values = true)]
    pub aws_access_key: String,

    #[arg(
        long,
        env = "AWS_SECRET_ACCESS_KEY",
        default_value = "",
        hide_env_values = true
    )]
    pub aws_secret_access_key: String,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub aws_session_token: Option<String>,

    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub aws_region: String,

    #[arg(long, env = "TFBACKEND_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ModuleArgs {
    pub args_file: PathBuf,

    /// Pin the module flavor instead of inferring it from `object`/`key`
    #[arg(long, value_enum)]
    pub flavor: Option<Flavor>,
}

impl AwsArgs {
    fn into_params(self, flavor: Flavor, bucket: String, object: String) -> ModuleParams {
        ModuleParams {
            flavor,
            bucket,
            object,
            credentials: CredentialParams {
                access_key: self.aws_access_key,
                secret_key: self.aws_secret_access_key,
                session_token: self.aws_session_token,
                profile: self.aws_profile,
                region: self.aws_region,
            },
            endpoint_url: self.endpoint_url.filter(|url| !url.is_empty()),
        }
    }
}

impl FetchArgs {
    pub fn into_params(self) -> ModuleParams {
        self.aws
            .into_params(Flavor::FetchOutputs, self.bucket, self.object)
    }
}

impl S3Args {
    pub fn into_params(self) -> ModuleParams {
        self.aws.into_params(Flavor::S3Backend, self.bucket, self.key)
    }
}

impl Cli {
    /// Output format and validated parameters for this invocation.
    ///
    /// Module mode always answers in JSON, since that is all Ansible reads.
    pub fn into_request(self) -> (OutputFormat, Result<ModuleParams, BackendError>) {
        let cli_params = |params: ModuleParams| match params.validate() {
            Ok(()) => Ok(params),
            Err(err) => Err(err.into()),
        };

        match (self.command, self.args_file) {
            (Some(Command::Fetch(args)), _) => (self.format, cli_params(args.into_params())),
            (Some(Command::S3(args)), _) => (self.format, cli_params(args.into_params())),
            (Some(Command::Module(args)), _) => (
                OutputFormat::Json,
                ModuleParams::from_args_file(&args.args_file, args.flavor),
            ),
            (None, Some(args_file)) => (
                OutputFormat::Json,
                ModuleParams::from_args_file(&args_file, None),
            ),
            (None, None) => (
                OutputFormat::Json,
                Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "no arguments file or subcommand given",
                )
                .into()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;
    use tfbackend::module::ParamError;

    const AWS_VARS: &[&str] = &[
        "AWS_PROFILE",
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        "AWS_REGION",
        "TFBACKEND_ENDPOINT_URL",
    ];

    /// Parses with all AWS variables cleared, restoring them afterwards.
    fn parse_without_env(argv: &[&str]) -> Cli {
        let backup: Vec<_> = AWS_VARS
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect();
        unsafe {
            for name in AWS_VARS {
                std::env::remove_var(name);
            }
        }

        let cli = Cli::parse_from(argv);

        unsafe {
            for (name, value) in backup {
                if let Some(value) = value {
                    std::env::set_var(name, value);
                }
            }
        }
        cli
    }

    #[test]
    #[serial]
    fn test_fetch_defaults() {
        let cli = parse_without_env(&["tfbackend", "fetch", "--bucket=b", "--object=o"]);

        assert_eq!(cli.format, OutputFormat::Json);
        if let Some(Command::Fetch(args)) = cli.command {
            let params = args.into_params();
            assert_eq!(params.flavor, Flavor::FetchOutputs);
            assert_eq!(params.bucket, "b");
            assert_eq!(params.object, "o");
            assert_eq!(params.credentials, CredentialParams::default());
            assert_eq!(params.endpoint_url, None);
        } else {
            panic!("Expected Fetch command, got {:?}", cli.command);
        }
    }

    #[test]
    #[serial]
    fn test_s3_with_explicit_keys() {
        let cli = parse_without_env(&[
            "tfbackend",
            "--format=table",
            "s3",
            "--bucket=b",
            "--key=k",
            "--aws-access-key=AKIA",
            "--aws-secret-access-key=secret",
            "--aws-region=ap-south-1",
        ]);

        assert_eq!(cli.format, OutputFormat::Table);
        if let Some(Command::S3(args)) = cli.command {
            let params = args.into_params();
            assert_eq!(params.flavor, Flavor::S3Backend);
            assert_eq!(params.object, "k");
            assert_eq!(params.credentials.access_key, "AKIA");
            assert_eq!(params.credentials.secret_key, "secret");
            assert_eq!(params.credentials.region, "ap-south-1");
        } else {
            panic!("Expected S3 command, got {:?}", cli.command);
        }
    }

    #[test]
    #[serial]
    fn test_profile_from_env_var_fallback() {
        let backup = std::env::var("AWS_PROFILE").ok();

        unsafe {
            std::env::set_var("AWS_PROFILE", "env_profile");
        }

        let cli = Cli::parse_from(["tfbackend", "fetch", "--bucket=b", "--object=o"]);

        unsafe {
            match backup {
                Some(profile) => std::env::set_var("AWS_PROFILE", profile),
                None => std::env::remove_var("AWS_PROFILE"),
            }
        }

        if let Some(Command::Fetch(args)) = cli.command {
            assert_eq!(args.aws.aws_profile, "env_profile");
        } else {
            panic!("Expected Fetch command, got {:?}", cli.command);
        }
    }

    #[test]
    #[serial]
    fn test_cli_flag_takes_precedence_over_env() {
        let backup = std::env::var("AWS_REGION").ok();

        unsafe {
            std::env::set_var("AWS_REGION", "env-region-1");
        }

        let cli = Cli::parse_from([
            "tfbackend",
            "s3",
            "--bucket=b",
            "--key=k",
            "--aws-region=cli-region-1",
        ]);

        unsafe {
            match backup {
                Some(region) => std::env::set_var("AWS_REGION", region),
                None => std::env::remove_var("AWS_REGION"),
            }
        }

        if let Some(Command::S3(args)) = cli.command {
            assert_eq!(args.aws.aws_region, "cli-region-1");
        } else {
            panic!("Expected S3 command, got {:?}", cli.command);
        }
    }

    #[test]
    #[serial]
    fn test_empty_endpoint_url_is_ignored() {
        let cli = parse_without_env(&[
            "tfbackend",
            "fetch",
            "--bucket=b",
            "--object=o",
            "--endpoint-url=",
        ]);

        if let Some(Command::Fetch(args)) = cli.command {
            assert_eq!(args.into_params().endpoint_url, None);
        } else {
            panic!("Expected Fetch command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_module_args() {
        let cli = Cli::parse_from(["tfbackend", "module", "/tmp/args.json", "--flavor=s3"]);

        if let Some(Command::Module(args)) = cli.command {
            assert_eq!(args.args_file, PathBuf::from("/tmp/args.json"));
            assert_eq!(args.flavor, Some(Flavor::S3Backend));
        } else {
            panic!("Expected Module command, got {:?}", cli.command);
        }
    }

    #[test]
    #[serial]
    fn test_session_token_from_env_var() {
        let backup = std::env::var("AWS_SESSION_TOKEN").ok();

        unsafe {
            std::env::set_var("AWS_SESSION_TOKEN", "tok");
        }

        let cli = Cli::parse_from([
            "tfbackend",
            "fetch",
            "--bucket=b",
            "--object=o",
            "--aws-access-key=ASIATEMP",
            "--aws-secret-access-key=tempsecret",
        ]);

        unsafe {
            match backup {
                Some(token) => std::env::set_var("AWS_SESSION_TOKEN", token),
                None => std::env::remove_var("AWS_SESSION_TOKEN"),
            }
        }

        if let Some(Command::Fetch(args)) = cli.command {
            let params = args.into_params();
            assert_eq!(params.credentials.session_token, Some("tok".to_string()));
        } else {
            panic!("Expected Fetch command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_bare_args_file_runs_module_mode() {
        let cli = Cli::parse_from(["tfbackend", "/tmp/args.json"]);

        assert!(cli.command.is_none());
        assert_eq!(cli.args_file, Some(PathBuf::from("/tmp/args.json")));
    }

    #[test]
    fn test_bare_args_file_forces_json() {
        let cli = Cli::parse_from(["tfbackend", "--format=table", "/nonexistent/args.json"]);

        let (format, params) = cli.into_request();
        assert_eq!(format, OutputFormat::Json);
        assert!(matches!(params, Err(BackendError::Io(_))));
    }

    #[test]
    #[serial]
    fn test_fetch_request_is_validated_once() {
        let cli = parse_without_env(&["tfbackend", "--format=table", "fetch", "--bucket=", "--object=o"]);

        let (format, params) = cli.into_request();
        assert_eq!(format, OutputFormat::Table);
        assert!(matches!(
            params,
            Err(BackendError::Params(ParamError::Empty(_)))
        ));
    }

    #[test]
    fn test_missing_bucket_is_rejected() {
        let result = Cli::try_parse_from(["tfbackend", "fetch", "--object=o"]);
        assert!(result.is_err());
    }
}
