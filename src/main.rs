//! Strumline CLI - Plays a strum pattern while scrolling it across the terminal

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use strumline::{
    AudioClock, CpalOutput, FrameTicker, StripLayout, StrumConfig, TextStrip, Transport,
    TransportError, TriggerSink, WallClock,
};

#[derive(Parser)]
#[command(name = "strumline")]
#[command(about = "Strum pattern trainer with a scrolling strip", long_about = None)]
struct Cli {
    /// Tempo in BPM (overrides the config file)
    #[arg(short, long)]
    bpm: Option<u32>,

    /// Pattern notation, e.g. "D..UUD..UUD. x4 | D-U- x2"
    #[arg(short, long)]
    pattern: Option<String>,

    /// Config file (.ron or .json); defaults to the user config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many seconds (plays until interrupted if omitted)
    #[arg(short, long)]
    seconds: Option<f64>,

    /// Frame rate of the scheduling/drawing loop
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Follow wall time without opening an audio device
    #[arg(long)]
    silent: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("strumline=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = StrumConfig::load_or_default(cli.config.as_deref())?;
    if let Some(bpm) = cli.bpm {
        config.tempo_bpm = bpm;
    }
    if let Some(pattern) = cli.pattern {
        config.pattern = Some(pattern);
    }
    config.validate()?;

    let ticks = FrameTicker::new(cli.fps);
    if cli.silent {
        let transport = config.build_transport(WallClock::new(), ticks)?;
        run(transport, &config, cli.seconds)?;
    } else {
        let output = CpalOutput::with_capacity(config.audio.volume, config.audio.ring_capacity);
        let transport = config.build_transport(output, ticks)?;
        run(transport, &config, cli.seconds)?;
    }

    Ok(())
}

/// Frame loop: schedule, then redraw the strip at the current offset
fn run<A>(
    mut transport: Transport<A, FrameTicker>,
    config: &StrumConfig,
    seconds: Option<f64>,
) -> Result<(), TransportError>
where
    A: AudioClock + TriggerSink,
{
    let layout = StripLayout::build(transport.timeline(), config.layout.viewport_width);
    let text = TextStrip::default();

    println!("{}  ({})", transport.pattern(), transport.tempo());

    transport.start()?;
    let started = Instant::now();
    let mut stdout = std::io::stdout();

    loop {
        transport.ticks_mut().wait_next_frame();
        transport.tick();

        let line = text.render(&layout, transport.current_offset());
        print!("\r|{}|", line);
        // Terminal output is best effort
        let _ = stdout.flush();

        if let Some(limit) = seconds
            && started.elapsed().as_secs_f64() >= limit
        {
            break;
        }
    }

    transport.stop();
    println!();
    Ok(())
}
