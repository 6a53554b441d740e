use anyhow::{Context, Result};
use clap::Parser;

use intervalgraph_core::{
    analyze_session, counters, load_config, parse_records, print_session_report, TimeRange,
    TimeRangeView,
};

/// Segmenterer og sammenligner en intervalløkt fra records- og laps-CSV.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Records-tabell (CSV)
    records: String,
    /// Laps-tabell (CSV)
    laps: String,
    #[arg(long, default_value = "Interval")]
    session_type: String,
    /// Analysekonfig (JSON). Mangler filen brukes default.
    #[arg(long)]
    config: Option<String>,
    /// Skriv full analyse som JSON i stedet for tekstrapport
    #[arg(long)]
    json: bool,
    /// Vis bare records i [from, to] (påvirker ikke statistikken)
    #[arg(long, requires = "to")]
    from: Option<f64>,
    #[arg(long, requires = "from")]
    to: Option<f64>,
    /// Skriv prosesstellere (Prometheus-tekstformat) til stderr
    #[arg(long)]
    counters: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let records_csv = std::fs::read_to_string(&args.records)
        .with_context(|| format!("kunne ikke lese {}", args.records))?;
    let laps_csv = std::fs::read_to_string(&args.laps)
        .with_context(|| format!("kunne ikke lese {}", args.laps))?;

    let cfg = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("ugyldig konfig {path}"))?,
        None => Default::default(),
    };

    let analysis = analyze_session(&records_csv, &laps_csv, &args.session_type, &cfg)
        .context("analyse feilet")?;

    if args.json {
        println!("{}", analysis.to_json_pretty()?);
    } else {
        print_session_report(&analysis);
    }

    if let (Some(from), Some(to)) = (args.from, args.to) {
        let parsed = parse_records(&records_csv)?;
        let mut view = TimeRangeView::new(&parsed.rows);
        view.set_time_range(TimeRange::new(from, to));
        let window = view.filtered_records();
        println!(
            "\nVindu [{from}, {to}]: {} av {} records",
            window.len(),
            view.all_records().len()
        );
        for r in window {
            println!(
                "  t={:.1} fart={:.2} puls={:.0} kadens={:.0}",
                r.timestamp, r.speed, r.heart_rate, r.cadence
            );
        }
    }

    if args.counters {
        eprint!("{}", counters::gather_text());
    }

    Ok(())
}
