use crate::cert::service::CertUserService;
use crate::cli::args::*;
use crate::cli::completions::handle_completion_command;
use crate::config::ServiceConfig;
use crate::utils::errors::{CertError, ServiceResult};
use crate::utils::output::OutputFormat;
use crate::utils::paths::{expand_home, write_secure_file};
use std::io;
use zeroize::Zeroizing;

const EXPIRY_WARNING_DAYS: u32 = 30;

pub async fn handle_command(cli: Cli) -> ServiceResult<()> {
    // Initialize logging - always to stderr
    if !cli.quiet {
        let log_level = match cli.verbose {
            0 => "usercert_rs=warn",  // Default: warnings only
            1 => "usercert_rs=info",  // -v: info level
            2 => "usercert_rs=debug", // -vv: debug level
            _ => "usercert_rs=trace", // -vvv+: trace level
        };

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(log_level)
            .init();
    }

    let output = OutputFormat::new(cli.raw);

    if let Commands::Completion { ref command } = cli.command {
        handle_completion_command(command);
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => ServiceConfig::load(expand_home(path))?,
        None => ServiceConfig::load_default()?,
    };
    let service = CertUserService::from_config(&config)?;

    match cli.command {
        Commands::Create { user, password } => {
            let password = read_password(password, true)?;
            let document = service.create_cert(&user, &password).await?;
            if !cli.quiet {
                let meta = &document.metadata;
                output.print_key_value(&[
                    ("User".to_string(), document.user_id.clone()),
                    ("Subject".to_string(), meta.subject.clone()),
                    ("Serial".to_string(), meta.serial.as_colon_hex()),
                    ("Not After".to_string(), meta.not_after.to_rfc3339()),
                    ("SHA-256".to_string(), meta.fingerprint.clone()),
                ]);
            }
            Ok(())
        }
        Commands::Info { user_id, password } => {
            let password = read_password(password, false)?;
            let info = service.get_user_cert_info(&user_id, &password).await?;
            print!("{info}");
            Ok(())
        }
        Commands::Show { user_id, text } => {
            let document = service.get_certificate(&user_id).await?;
            let meta = &document.metadata;
            if meta.is_expired() {
                tracing::warn!("Certificate for {user_id} expired on {}", meta.not_after);
            } else if meta.expires_soon(EXPIRY_WARNING_DAYS) {
                tracing::warn!("Certificate for {user_id} expires on {}", meta.not_after);
            }
            if text {
                output.print_key_value(&document.metadata.summary_pairs());
                println!();
            }
            print!("{}", document.certificate.to_pem().pem_data());
            Ok(())
        }
        Commands::Exists { user_id } => {
            let exists = service.has_certificate_entry(&user_id).await?;
            if cli.raw {
                output.print_list(&[exists]);
            } else {
                output.print_key_value(&[(user_id, exists.to_string())]);
            }
            Ok(())
        }
        Commands::Delete { user_id } => {
            service.delete_certificate_entry(&user_id).await?;
            if !cli.quiet {
                println!("Deleted certificate entry for {user_id}");
            }
            Ok(())
        }
        Commands::Export { user_id, output: path } => {
            let keystore = service.export_keystore(&user_id).await?;
            let path = expand_home(&path);
            write_secure_file(&path, &keystore)?;
            if !cli.quiet {
                println!("Keystore for {user_id} written to {}", path.display());
            }
            Ok(())
        }
        Commands::Completion { .. } => Ok(()),
    }
}

/// Password from the command line or environment, else prompted on the terminal
fn read_password(args: PasswordArgs, confirm: bool) -> ServiceResult<Zeroizing<String>> {
    if let Some(password) = args.password {
        return Ok(Zeroizing::new(password));
    }

    let password = Zeroizing::new(prompt("Keystore password: ")?);
    if confirm {
        let again = Zeroizing::new(prompt("Confirm password: ")?);
        if *password != *again {
            return Err(CertError::InvalidInput("Passwords do not match".to_string()).into());
        }
    }
    Ok(password)
}

fn prompt(message: &str) -> ServiceResult<String> {
    rpassword::prompt_password(message)
        .map_err(|e| CertError::InvalidInput(format!("Failed to read password: {e}")).into())
}
