use chrono::Utc;
use clap::Parser;
use log::{error, info, warn};
use sonde::charts::TimeRange;
use sonde::configuration::config::{CliArgs, Config};
use sonde::controller::controller_handler::Controller;
use sonde::presentation::render::{AlertList, ChartPanel, DashboardPanel, PacketTable, ProtocolPanel};
use sonde::query::FilterSpec;

#[derive(Parser)]
#[command(name = "sonde")]
#[command(version = "0.1.0")]
#[command(about = "Live terminal view of network telemetry")]
struct Args {
    #[command(flatten)]
    config: CliArgs,

    /// Only show packets of this protocol
    #[arg(long)]
    protocol: Option<String>,

    /// Only show alerts of this severity (high, medium, low)
    #[arg(long)]
    severity: Option<String>,

    /// Free-text alert search
    #[arg(long)]
    search: Option<String>,

    /// Traffic chart window: 1h, 24h, 7d or 30d
    #[arg(long, default_value = "1h")]
    range: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    println!(
        "
███████╗ ██████╗ ███╗   ██╗██████╗ ███████╗
██╔════╝██╔═══██╗████╗  ██║██╔══██╗██╔════╝
███████╗██║   ██║██╔██╗ ██║██║  ██║█████╗
╚════██║██║   ██║██║╚██╗██║██║  ██║██╔══╝
███████║╚██████╔╝██║ ╚████║██████╔╝███████╗
╚══════╝ ╚═════╝ ╚═╝  ╚═══╝╚═════╝ ╚══════╝
============================================
      Live network telemetry v0.1.0
============================================
"
    );

    let args = Args::parse();

    let range = match TimeRange::parse(&args.range) {
        Some(range) => range,
        None => {
            error!("Unknown chart range '{}', expected 1h, 24h, 7d or 30d", args.range);
            std::process::exit(1);
        }
    };

    info!("Importing configuration");
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration imported successfully");

    let render_every = config.render_interval();
    let mut controller = match Controller::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    let mut packet_filter = FilterSpec::new();
    if let Some(protocol) = args.protocol {
        packet_filter = packet_filter.with_equals("protocol", protocol);
    }
    let mut alert_filter = FilterSpec::new();
    if let Some(severity) = args.severity {
        alert_filter = alert_filter.with_equals("severity", severity);
    }
    if let Some(search) = args.search {
        alert_filter = alert_filter.with_search(search);
    }

    controller.start().await;
    if !packet_filter.is_empty() {
        if let Err(e) = controller.set_packet_filter(packet_filter).await {
            warn!("Filtered packet load failed: {}", e);
        }
    }
    if !alert_filter.is_empty() {
        if let Err(e) = controller.set_alert_filter(alert_filter).await {
            warn!("Filtered alert load failed: {}", e);
        }
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(render_every);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupt received");
                break;
            }
            alive = controller.next_event() => {
                if !alive {
                    warn!("Event stream closed");
                    break;
                }
            }
            _ = ticker.tick() => {
                controller.sweep_highlights();
                render(&controller, range);
            }
        }
    }

    controller.shutdown().await;
    info!("Bye");
}

fn render(controller: &Controller, range: TimeRange) {
    let now = Utc::now();
    let packets = controller.packet_table(None);
    let alerts = controller.alert_feed(None);
    let chart = controller.traffic_chart(range, now);
    let protocols = controller.protocol_chart();

    println!("\n==== Dashboard ({}) ====", now.format("%Y-%m-%d %H:%M:%S UTC"));
    print!("{}", DashboardPanel(&controller.dashboard()));
    println!("---- Protocols ----");
    print!("{}", ProtocolPanel(&protocols));
    print!("{}", ChartPanel(&chart));
    println!("---- Recent packets ----");
    print!("{}", PacketTable { view: &packets, now });
    println!("---- Alerts ----");
    print!("{}", AlertList { feed: &alerts, now });
}
