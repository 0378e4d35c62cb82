use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use strumline::audio::StrumVoices;
use strumline::messaging::command::AudioCommand;
use strumline::{
    LookaheadScheduler, ManualClock, Pattern, SchedulerSettings, StripLayout, StripWidths,
    Stroke, Tempo, TextStrip, flatten, resolve_rate,
};

/// Benchmark one frame's scheduling pass (runs every display frame)
fn bench_scheduler_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");
    let widths = StripWidths::default();
    let timeline = flatten(&Pattern::default_strum(), &widths);

    for bpm in [60, 120, 300] {
        let rate = resolve_rate(Tempo::new(bpm).unwrap(), widths.step_width);

        group.bench_with_input(BenchmarkId::new("frame_ticks", bpm), &bpm, |b, _| {
            b.iter(|| {
                let mut scheduler = LookaheadScheduler::new(SchedulerSettings::default(), 0.0);
                let mut sink = ManualClock::new();
                // One second of 60 fps ticks
                for frame in 0..60 {
                    let now = frame as f64 / 60.0;
                    black_box(scheduler.schedule(now, &timeline, &rate, &mut sink));
                }
                black_box(sink.triggers().len())
            });
        });
    }
    group.finish();
}

/// Benchmark re-flattening after an edit
fn bench_flatten(c: &mut Criterion) {
    let pattern: Pattern = "D..UUD..UUD. x4 | D-U- x2 | DUDU DUDU x8".parse().unwrap();
    let widths = StripWidths::default();

    c.bench_function("flatten", |b| {
        b.iter(|| black_box(flatten(black_box(&pattern), &widths)))
    });
}

/// Benchmark the terminal strip redraw
fn bench_text_strip(c: &mut Criterion) {
    let timeline = flatten(&Pattern::default_strum(), &StripWidths::default());
    let layout = StripLayout::build(&timeline, 1000.0);
    let text = TextStrip::default();

    c.bench_function("text_strip_render", |b| {
        let mut offset = 0.0;
        b.iter(|| {
            offset = (offset + 3.3) % 2560.0;
            black_box(text.render(&layout, offset))
        })
    });
}

/// Benchmark the audio-thread mixer (critical for real-time performance)
fn bench_strum_voices(c: &mut Criterion) {
    let buffer_size = 512u64;

    c.bench_function("strum_voices_buffer", |b| {
        let mut voices = StrumVoices::new(48000.0, 0.8);
        let mut position = 0u64;
        b.iter(|| {
            voices.handle(AudioCommand::Strum {
                stroke: Stroke::Down,
                at_sample: position + 100,
            });
            for i in 0..buffer_size {
                black_box(voices.next_sample(position + i));
            }
            position += buffer_size;
        })
    });
}

criterion_group!(
    benches,
    bench_scheduler_tick,
    bench_flatten,
    bench_text_strip,
    bench_strum_voices
);
criterion_main!(benches);
