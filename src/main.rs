//! Command-line interface for the ESC/P-R codec
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use escpr::connection::{capture_job, PrinterConnection, TcpConnection};
use escpr::decoder::JobDecoder;
use escpr::printjob::PrintJob;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Epson ESC/P-Raster toolbox",
    long_about = "Capture, decode and synthesize ESC/P-Raster print jobs.\n\nCapture a driver's job with `server`, replay it into a PNG with `decode`, or compile an image into a job and send it to a printer with `encode`."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, help = "Enable debug logging output")]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Capture one raw print job into a file
    Server {
        #[arg(
            long,
            default_value = "127.0.0.1:9100",
            help = "Address to listen on"
        )]
        listen: SocketAddr,

        #[arg(
            short,
            long,
            default_value = "out.epson",
            value_name = "FILE",
            help = "Capture output file"
        )]
        output: PathBuf,
    },
    /// Decode a captured job into a PNG image
    Decode {
        #[arg(value_name = "CAPTURE", help = "Path to the captured ESC/P-R stream")]
        capture: PathBuf,

        #[arg(
            short,
            long,
            default_value = "out.png",
            value_name = "FILE",
            help = "Rendered page output file"
        )]
        output: PathBuf,
    },
    /// Synthesize a job from an image and send it to a printer
    Encode {
        #[arg(value_name = "IMAGE", help = "Path to the source image (PNG, JPEG, etc.)")]
        image: PathBuf,

        #[arg(
            short,
            long,
            value_name = "HOST",
            help = "Printer hostname or IP address"
        )]
        printer: String,

        #[arg(
            long,
            default_value_t = 360,
            help = "Print resolution in dots per inch"
        )]
        dpi: u32,

        #[arg(long, help = "PackBits-compress raster payloads")]
        compress: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            cli.debug.then_some("debug").unwrap_or("info"),
        ))
        .init();
    match cli.command {
        Commands::Server { listen, output } => {
            let bytes = capture_job(listen, &output).context("capturing print job")?;
            println!("captured {bytes} bytes to {}", output.display());
        }
        Commands::Decode { capture, output } => {
            let file = File::open(&capture)
                .with_context(|| format!("opening capture {}", capture.display()))?;
            let page = JobDecoder::new(BufReader::new(file))
                .decode()
                .context("decoding capture")?;
            page.save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "decoded {}x{} page to {}",
                page.width(),
                page.height(),
                output.display()
            );
        }
        Commands::Encode {
            image,
            printer,
            dpi,
            compress,
        } => {
            let image = image::open(&image)
                .with_context(|| format!("opening image {}", image.display()))?;
            let job = PrintJob::new(image).dpi(dpi).compressed(compress);
            let mut connection =
                TcpConnection::open(&printer).context("connecting to printer")?;
            connection.print(&job).context("transmitting job")?;
            println!("job sent to {printer}");
        }
    }
    Ok(())
}
