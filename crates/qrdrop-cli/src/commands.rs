use std::fs;

use anyhow::Context;
use colored::Colorize;
use qrdrop_render::{render, to_data_uri, RenderOptions};
use qrdrop_server::QrDropServer;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Qr(args) => cmd_qr(args),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.into_config();
    config.validate().context("invalid server configuration")?;

    let backend = match &config.upload_dir {
        Some(dir) => format!("disk at {}", dir.display()),
        None => "memory".to_string(),
    };
    println!(
        "{} QR Drop on {} ({} store, images expire after {}h)",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        backend.cyan(),
        config.expiration_hours,
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime
        .block_on(QrDropServer::new(config).serve())
        .context("server stopped with an error")?;
    Ok(())
}

fn cmd_qr(args: QrArgs) -> anyhow::Result<()> {
    let options = RenderOptions::default()
        .with_ec_level(args.ec)
        .with_module_size(args.module_size);
    tracing::debug!(url = %args.url, ec = %options.ec_level, "rendering QR code");
    let png = render(&args.url, &options)
        .with_context(|| format!("cannot encode '{}' as a QR code", args.url))?;

    match args.output {
        Some(path) => {
            fs::write(&path, &png)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!(
                "{} Wrote {} ({} bytes, EC level {})",
                "✓".green().bold(),
                path.display().to_string().bold(),
                png.len(),
                options.ec_level.to_string().yellow(),
            );
        }
        None => println!("{}", to_data_uri("image/png", &png)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn qr_writes_png_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("code.png");
        let cli = Cli::try_parse_from([
            "qrdrop", "qr", "http://localhost:5000/image/abc",
            "-o", out.to_str().unwrap(),
            "--module-size", "4",
        ])
        .unwrap();
        run_command(cli).unwrap();
        let bytes = fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn qr_reports_invalid_module_size() {
        let cli = Cli::try_parse_from([
            "qrdrop",
            "qr",
            "http://x",
            "--module-size",
            "0",
            "-o",
            "/nonexistent/x.png",
        ])
        .unwrap();
        let err = run_command(cli).unwrap_err();
        assert!(err.to_string().contains("cannot encode"));
    }

    #[test]
    fn serve_rejects_invalid_config_before_starting() {
        let cli = Cli::try_parse_from(["qrdrop", "serve", "--expiration-hours", "0"]).unwrap();
        assert!(run_command(cli).is_err());
    }
}
