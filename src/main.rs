#[cfg(not(all(feature = "psg", feature = "sequencer")))]
fn main() {
    eprintln!(
        "The soundcortex CLI requires the \"psg\" and \"sequencer\" features. Rebuild with the default feature set to enable it."
    );
}

#[cfg(all(feature = "psg", feature = "sequencer"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(all(feature = "psg", feature = "sequencer"))]
mod cli {
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    use anyhow::{Context, Result};

    use soundcortex::{CortexConfig, Sequencer, SoundCortex, OUTPUT_BIAS};

    /// Hard cap on rendered audio when the song loops forever
    const DEFAULT_SECONDS: u32 = 60;

    struct Args {
        song: PathBuf,
        output: PathBuf,
        config: Option<PathBuf>,
        seconds: u32,
        repeat: bool,
        play: bool,
    }

    fn usage() -> ! {
        eprintln!("Usage: soundcortex <song.mid> [options]");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  -o, --output <file.wav>   WAV output path (default: song.wav)");
        eprintln!("  -c, --config <file.json>  device configuration file");
        eprintln!("  -s, --seconds <n>         rendering cap in seconds (default: 60)");
        eprintln!("  -r, --repeat              loop the song at end of track");
        eprintln!("      --play                play live instead of writing a WAV");
        eprintln!("                            (requires the \"streaming\" feature)");
        std::process::exit(2);
    }

    fn parse_args() -> Args {
        let mut song = None;
        let mut output = None;
        let mut config = None;
        let mut seconds = DEFAULT_SECONDS;
        let mut repeat = false;
        let mut play = false;

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-o" | "--output" => output = args.next().map(PathBuf::from),
                "-c" | "--config" => config = args.next().map(PathBuf::from),
                "-s" | "--seconds" => {
                    seconds = args
                        .next()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or_else(|| usage())
                }
                "-r" | "--repeat" => repeat = true,
                "--play" => play = true,
                "-h" | "--help" => usage(),
                other if song.is_none() && !other.starts_with('-') => {
                    song = Some(PathBuf::from(other));
                }
                _ => usage(),
            }
        }

        let Some(song) = song else { usage() };
        let output = output.unwrap_or_else(|| song.with_extension("wav"));
        Args {
            song,
            output,
            config,
            seconds,
            repeat,
            play,
        }
    }

    pub fn run() -> Result<()> {
        let args = parse_args();

        let mut config = match &args.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config '{}'", path.display()))?;
                serde_json::from_str::<CortexConfig>(&text)
                    .with_context(|| format!("failed to parse config '{}'", path.display()))?
            }
            None => CortexConfig::default(),
        };
        if args.repeat {
            config.repeat = true;
        }

        let data = fs::read(&args.song)
            .with_context(|| format!("failed to read song '{}'", args.song.display()))?;
        let sequencer = Sequencer::with_options(data, config.repeat, config.gap)
            .context("song stream rejected")?;

        let mut cortex = SoundCortex::from_config(&config);
        cortex.attach_sequencer(sequencer)?;

        if args.play {
            return play_live(cortex, config.sample_rate);
        }
        render_wav(cortex, &config, &args)
    }

    fn render_wav(mut cortex: SoundCortex, config: &CortexConfig, args: &Args) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&args.output, spec)
            .with_context(|| format!("failed to create '{}'", args.output.display()))?;

        let cap = args.seconds as u64 * config.sample_rate as u64;
        let mut rendered = 0u64;
        while cortex.sequencer_active() && rendered < cap {
            let word = cortex.render_next_sample();
            writer.write_sample(((word as i32 - OUTPUT_BIAS as i32) * 128) as i16)?;
            rendered += 1;
        }
        writer.finalize()?;

        println!(
            "Rendered {:.2}s to {}",
            rendered as f64 / config.sample_rate as f64,
            args.output.display()
        );
        Ok(())
    }

    #[cfg(feature = "streaming")]
    fn play_live(cortex: SoundCortex, sample_rate: u32) -> Result<()> {
        use parking_lot::Mutex;
        use soundcortex::streaming::DEFAULT_RING_CAPACITY;
        use soundcortex::{AudioDevice, RingBuffer, SampleClock};
        use std::sync::Arc;
        use std::time::Duration;

        let cortex = cortex.into_shared();
        let buffer = Arc::new(Mutex::new(RingBuffer::new(DEFAULT_RING_CAPACITY)));

        let clock = SampleClock::start(Arc::clone(&cortex), Arc::clone(&buffer), sample_rate);
        let device = AudioDevice::new(sample_rate, Arc::clone(&buffer))?;
        device.play();

        while cortex.lock().sequencer_active() {
            std::thread::sleep(Duration::from_millis(50));
        }
        // Let the device drain what the clock already rendered
        while buffer.lock().available_read() > 0 {
            std::thread::sleep(Duration::from_millis(10));
        }
        clock.stop();
        device.finish();
        Ok(())
    }

    #[cfg(not(feature = "streaming"))]
    fn play_live(_cortex: SoundCortex, _sample_rate: u32) -> Result<()> {
        anyhow::bail!("live playback requires the \"streaming\" feature");
    }
}
