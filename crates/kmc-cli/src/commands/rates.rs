use crate::cli::RatesArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use optokmc::core::io::load_system;
use optokmc::core::neighbors::{NeighborRange, NeighborTable, RateChannel};
use std::io::Write;
use tracing::info;

pub fn run(args: RatesArgs) -> Result<()> {
    let paths = PartialRunConfig::from_file(&args.config)?.system_paths()?;
    let system = load_system(&paths)?;

    let file = std::fs::File::create(&args.output)?;
    let written = write_rate_table(&system.neighbors, file).map_err(|e| CliError::FileParsing {
        path: args.output.clone(),
        source: e.into(),
    })?;
    info!("Wrote {} directed records to {:?}", written, &args.output);
    println!(
        "✓ Rate table ({written} records) written to: {}",
        args.output.display()
    );
    Ok(())
}

/// Writes one CSV row per directed record, short-range first.
pub fn write_rate_table<W: Write>(table: &NeighborTable, out: W) -> csv::Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec!["range", "from", "to", "distance", "dx", "dy", "dz"];
    header.extend(RateChannel::ALL.iter().map(|c| c.as_str()));
    writer.write_record(&header)?;

    let mut written = 0;
    for range in [NeighborRange::Short, NeighborRange::Long] {
        for from in 0..table.site_count() {
            let records = match range {
                NeighborRange::Short => table.short_range_neighbors_of(from),
                NeighborRange::Long => table.long_range_neighbors_of(from),
            };
            for record in records {
                let mut row = vec![
                    range.to_string(),
                    from.to_string(),
                    record.target.to_string(),
                    format!("{:.6}", record.distance),
                    format!("{:.6}", record.dr.x),
                    format!("{:.6}", record.dr.y),
                    format!("{:.6}", record.dr.z),
                ];
                row.extend(record.rates().iter().map(|r| format!("{r:.5e}")));
                writer.write_record(&row)?;
                written += 1;
            }
        }
    }
    writer.flush()?;
    Ok(written)
}
