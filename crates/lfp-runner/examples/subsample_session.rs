//! End-to-end demo of the LFP subsampling framework
//!
//! Simulates a three-probe session (probe B deliberately unregistered),
//! runs the concurrent subsampling pipeline against it, and prints the
//! run report together with basic statistics of the persisted outputs.

use anyhow::Result;
use lfp_core::ProbeId;
use lfp_processing::SubsamplingConfig;
use lfp_runner::{
    MemoryAnnotationSource, MemoryRecordingSink, MemoryRecordingSource, PipelineRunner,
    ProbeStatus, RecordingSink,
};
use lfp_simulation::{surface_annotations, LfpSimulator, SimulationConfig};
use std::sync::Arc;

const SESSION_ID: &str = "626791_2022-08-16";
const CHANNELS: usize = 384;
const SAMPLES: usize = 10000;
const SURFACE_CHANNEL: usize = 350;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut source = MemoryRecordingSource::new();
    let mut annotations = MemoryAnnotationSource::new();

    for (seed, letter) in [(11u64, 'A'), (12, 'B'), (13, 'C')] {
        let probe = ProbeId::from_letter(letter)?;
        let mut simulator = LfpSimulator::new(SimulationConfig {
            channel_count: CHANNELS,
            num_samples: SAMPLES,
            seed: Some(seed),
            ..SimulationConfig::default()
        })?;
        source.insert(probe, simulator.generate(probe)?);

        // Probe B never went through anatomical registration; the run will
        // skip it rather than fabricate a reference.
        if letter != 'B' {
            annotations.insert(probe, surface_annotations(probe, CHANNELS, SURFACE_CHANNEL));
        }
    }

    let config = SubsamplingConfig::default();
    println!("Configuration:\n{}\n", config.to_json()?);

    let sink = Arc::new(MemoryRecordingSink::new());
    let runner = PipelineRunner::new(config)?.with_max_workers(3);
    let report = runner
        .run(
            SESSION_ID,
            Arc::new(source),
            Arc::new(annotations),
            sink.clone() as Arc<dyn RecordingSink>,
        )
        .await?;

    println!("Session {} finished:", report.session_id);
    for outcome in &report.outcomes {
        match &outcome.status {
            ProbeStatus::Done { channels, samples } => {
                println!("  {}: done ({} channels x {} samples)", outcome.probe, channels, samples);
                if let Some(stored) = sink.get(SESSION_ID, outcome.probe) {
                    let stats = stored.channel_stats(0)?;
                    println!(
                        "      {} @ {:.0} Hz, channel 0 rms {:.4}",
                        stored.channel_ids()[0],
                        stored.sampling_rate(),
                        stats.rms
                    );
                }
            }
            ProbeStatus::Skipped { reason } => {
                println!("  {}: skipped ({})", outcome.probe, reason);
            }
            ProbeStatus::Failed { error } => {
                println!("  {}: FAILED ({})", outcome.probe, error);
            }
        }
    }
    println!(
        "{} done, {} skipped, {} failed",
        report.done_count(),
        report.skipped_count(),
        report.failed_count()
    );

    Ok(())
}
