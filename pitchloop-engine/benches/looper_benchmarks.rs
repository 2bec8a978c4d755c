#[macro_use]
extern crate criterion;

use criterion::{BatchSize, Criterion};
use pitchloop_common::api::{Buffers, LooperCommand};
use pitchloop_common::config::Config;
use pitchloop_common::gui_channel::GuiSender;
use pitchloop_engine::looper::Looper;
use pitchloop_engine::pitch_shift::PitchShifter;
use pitchloop_engine::Engine;

fn playing_looper(frames: usize) -> Looper {
    let input = vec![0.25f32; frames];
    let mut output = vec![0f32; frames];

    let mut l = Looper::with_capacity(0, frames, GuiSender::disconnected());
    l.handle_command(LooperCommand::Record, &mut ());
    l.bar();
    l.process(frames, &mut Buffers::new(&input, &mut output));
    l.handle_command(LooperCommand::Play, &mut ());
    l.bar();
    l
}

pub fn looper_benchmark(c: &mut Criterion) {
    let input = vec![0.5f32; 128];
    let mut output = vec![0f32; 128];

    c.bench_function("pitch shift [128]", |b| {
        let mut ps = PitchShifter::new();
        b.iter(|| ps.process(-3.0, &input, &mut output))
    });

    c.bench_function("record [128]", |b| {
        b.iter_batched(
            || {
                let mut l = Looper::with_capacity(0, 4096, GuiSender::disconnected());
                l.handle_command(LooperCommand::Record, &mut ());
                l.bar();
                l
            },
            |mut l| {
                l.process(128, &mut Buffers::new(&input, &mut output));
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("playback [128]", |b| {
        b.iter_batched(
            || playing_looper(44100),
            |mut l| {
                l.process(128, &mut Buffers::new(&input, &mut output));
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("engine 8 tracks [256]", |b| {
        let input = vec![0.5f32; 256];
        let mut output = vec![0f32; 256];
        let (gui_sender, _gui_receiver) = GuiSender::new(512);
        let (_tx, rx) = crossbeam_channel::bounded(16);
        let mut engine = Engine::new(&Config::new(), 8000, gui_sender, rx).unwrap();
        let midi: Vec<[u8; 3]> = (0..8).map(|ch| [0x90 | ch, 48, 100]).collect();
        engine.process(&mut (), &input, &mut output, &midi);

        b.iter(|| engine.process(&mut (), &input, &mut output, &[]))
    });
}

criterion_group!(looper_benchmarks, looper_benchmark);
criterion_main!(looper_benchmarks);
