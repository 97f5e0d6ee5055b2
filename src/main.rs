use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use wattlog::{
    AddDeviceForm, DayCode, DeviceCatalog, DeviceCategory, DeviceDescriptor, FileStore,
    FrequencyKind, RecordId, UsageRecord, UsageTracker,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFrequency {
    Everyday,
    Weekdays,
    Weekends,
    Specific,
}

impl From<CliFrequency> for FrequencyKind {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Everyday => FrequencyKind::Everyday,
            CliFrequency::Weekdays => FrequencyKind::Weekdays,
            CliFrequency::Weekends => FrequencyKind::Weekends,
            CliFrequency::Specific => FrequencyKind::Specific,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCategory {
    Entertainment,
    Kitchen,
    Climate,
    Laundry,
    Computing,
    Lighting,
    PersonalCare,
    WaterHeating,
    Other,
}

impl From<CliCategory> for DeviceCategory {
    fn from(value: CliCategory) -> Self {
        match value {
            CliCategory::Entertainment => DeviceCategory::Entertainment,
            CliCategory::Kitchen => DeviceCategory::Kitchen,
            CliCategory::Climate => DeviceCategory::Climate,
            CliCategory::Laundry => DeviceCategory::Laundry,
            CliCategory::Computing => DeviceCategory::Computing,
            CliCategory::Lighting => DeviceCategory::Lighting,
            CliCategory::PersonalCare => DeviceCategory::PersonalCare,
            CliCategory::WaterHeating => DeviceCategory::WaterHeating,
            CliCategory::Other => DeviceCategory::Other,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "wattlog",
    version,
    about = "Track how long household devices run and estimate daily usage"
)]
struct Cli {
    #[arg(long, global = true, default_value = "wattlog-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List device types from the catalog.
    Devices {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        category: Option<CliCategory>,
    },
    /// Record how a device is used.
    Add {
        #[arg(long)]
        device: String,
        #[arg(long, value_enum)]
        frequency: CliFrequency,
        #[arg(long, value_delimiter = ',')]
        days: Vec<DayCode>,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        hours: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        minutes: String,
        #[arg(long)]
        wattage: Option<u32>,
    },
    /// Show stored usage records.
    History,
    /// Delete a usage record by id.
    Remove { id: RecordId },
    /// Show recently used device types.
    Recent,
    /// Show total daily usage across all records.
    Summary,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = Arc::new(FileStore::new(&cli.data_dir));
    let mut tracker = UsageTracker::new(DeviceCatalog::builtin(), store);

    match cli.command {
        Command::Devices { search, category } => {
            print_devices(tracker.catalog(), search.as_deref(), category.map(Into::into));
        }
        Command::Add {
            device,
            frequency,
            days,
            hours,
            minutes,
            wattage,
        } => {
            if !days.is_empty() && frequency != CliFrequency::Specific {
                bail!("--days can only be used with --frequency specific");
            }

            let mut form = AddDeviceForm::new();
            form.select_device_id(device);
            if let Some(watts) = wattage {
                form.set_wattage(watts);
            }
            form.set_frequency(frequency.into());
            form.set_days(days);
            form.edit_duration(hours, minutes);

            let outcome = tracker.submit(&mut form).await?;
            println!("{} has been added successfully!", outcome.record.device_name);
            println!("{}", format_record(&outcome.record));
            if !outcome.recent_updated {
                eprintln!("warning: recently used devices could not be updated");
            }
        }
        Command::History => {
            let records = tracker
                .history()
                .list()
                .await
                .context("failed to load usage history")?;
            if records.is_empty() {
                println!("No devices added yet");
            }
            for record in records {
                println!("{}", format_record(record));
            }
        }
        Command::Remove { id } => {
            let removed = tracker.history().remove(id).await?;
            println!("removed {} ({})", removed.device_name, removed.id);
        }
        Command::Recent => {
            let recent = tracker
                .recent()
                .list()
                .await
                .context("failed to load recently used devices")?;
            for device in recent {
                println!("{}", format_device(device));
            }
        }
        Command::Summary => {
            let summary = tracker
                .history()
                .summary()
                .await
                .context("failed to load usage history")?;
            println!("devices: {}", summary.record_count);
            println!("daily usage: {} hrs", summary.daily_usage);
            println!("daily energy: {:.1} Wh", summary.daily_watt_hours);
        }
    }

    Ok(())
}

fn print_devices(catalog: &DeviceCatalog, search: Option<&str>, category: Option<DeviceCategory>) {
    let matches = catalog.search(search.unwrap_or_default());
    for device in matches {
        if let Some(wanted) = category
            && catalog.category_of(&device.id) != Some(wanted)
        {
            continue;
        }
        println!("{}", format_device(device));
    }
}

fn format_device(device: &DeviceDescriptor) -> String {
    format!(
        "{:<18} {:<28} {:>5} W",
        device.id, device.display_name, device.default_wattage
    )
}

fn format_record(record: &UsageRecord) -> String {
    format!(
        "{}  {}  {} {}  {} hrs/day",
        record.id, record.device_name, record.duration, record.frequency, record.daily_usage
    )
}
