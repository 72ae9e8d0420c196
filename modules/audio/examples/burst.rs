//! Triggers bursts of hit-sounds on a handful of pools, then reclaims the
//! extra handles they minted.

extern crate env_logger;
extern crate polyclip_audio;

use std::f32::consts::PI;
use std::thread;
use std::time::Duration;

use polyclip_audio::prelude::*;

fn tone(frequency: f32, millis: u32) -> Result<SampleBuffer> {
    let sample_rate = 44_100;
    let frames = sample_rate * millis / 1000;

    let mut data = Vec::with_capacity(frames as usize * 4);
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let v = (2.0 * PI * frequency * t).sin() * 0.5;
        data.extend_from_slice(&v.to_ne_bytes());
    }

    let format = StreamFormat::new(Encoding::Float, 32, 1, sample_rate);
    SampleBuffer::new(data, format)
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let settings = AudioSettings {
        max_extra_handles: 8,
        ..Default::default()
    };
    polyclip_audio::setup(settings)?;

    let pools = vec![
        polyclip_audio::create_pool("kick", Some(tone(60.0, 400)?))?,
        polyclip_audio::create_pool("snare", Some(tone(220.0, 300)?))?,
        polyclip_audio::create_pool("hat", Some(tone(880.0, 200)?))?,
    ];

    for round in 0..4 {
        for pool in &pools {
            pool.start(0.8, None)?;
        }

        println!(
            "round {}: {} extra handle(s), pools {:?}",
            round,
            polyclip_audio::extra_handles()?,
            pools.iter().map(|v| v.len()).collect::<Vec<_>>()
        );

        thread::sleep(Duration::from_millis(50));
    }

    if let Some(eviction) = polyclip_audio::request_eviction()? {
        let report = eviction.wait();
        println!(
            "evicted {} of {} clip(s), {} leaked",
            report.destroyed, report.collected, report.leaked
        );
    }

    println!(
        "after eviction: {} extra handle(s), pools {:?}",
        polyclip_audio::extra_handles()?,
        pools.iter().map(|v| v.len()).collect::<Vec<_>>()
    );

    drop(pools);
    polyclip_audio::discard();
    Ok(())
}
