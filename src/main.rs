use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use weighted_wheel::weights::parse_weight_override;
use weighted_wheel::{Wheel, WheelConfig, WheelError, WheelRenderer};

#[derive(Parser, Debug)]
#[command(author, version, about = "Spin a weighted wheel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Wheel config (JSON). Built-in reference wheel if omitted.
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs.
    #[arg(global = true, short, long)]
    seed: Option<u64>,

    /// Override a label weight, e.g. --weight "Coin Flip=2.5". Repeatable.
    #[arg(global = true, short, long = "weight", value_name = "LABEL=WEIGHT")]
    weights: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Spin once and optionally render the animation.
    Spin(SpinArgs),
    /// Draw many outcomes and compare with the expected odds.
    Simulate(SimulateArgs),
    /// Print each label's effective probability.
    Odds,
}

#[derive(Args, Debug)]
struct SpinArgs {
    /// Animation frames (overrides config).
    #[arg(long)]
    frames: Option<usize>,

    /// Write the whole spin as an animated GIF.
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Write the settled frame as an image (PNG or JPEG by extension).
    #[arg(long)]
    png: Option<PathBuf>,

    /// Image side length in pixels.
    #[arg(long, default_value_t = 480)]
    size: u32,

    /// Print the result as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long, default_value_t = 10_000)]
    samples: u64,
}

fn load_wheel(cli: &Cli) -> Result<Wheel, WheelError> {
    let mut config = match &cli.config {
        Some(path) => WheelConfig::load_from_file(path)?,
        None => WheelConfig::reference(),
    };
    for arg in &cli.weights {
        let (label, weight) = parse_weight_override(arg)?;
        config.set_weight(label, weight);
    }
    config.build()
}

fn make_rng(seed: Option<u64>) -> Pcg32 {
    match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    }
}

fn run_spin(mut wheel: Wheel, args: &SpinArgs, rng: &mut Pcg32) -> Result<(), WheelError> {
    if let Some(frames) = args.frames {
        wheel.frame_count = frames;
    }
    let mut spin = wheel.spin(rng)?;
    let result = spin.result().clone();

    match (&args.gif, &args.png) {
        (None, None) => {
            // Nobody is watching; just run the frames out.
            let settled = spin.by_ref().last();
            log::debug!("Settled frame: {:?}", settled);
        }
        (gif, png) => {
            let renderer = WheelRenderer::new(args.size);
            let mut last = None;
            if let Some(path) = gif {
                let frames = spin.by_ref().inspect(|f| last = Some(*f));
                renderer.write_gif(&wheel.layout, frames, path)?;
                println!("Spin animation written to {}", path.display());
            } else {
                last = spin.by_ref().last();
            }
            if let (Some(path), Some(frame)) = (png, last) {
                renderer.write_still(&wheel.layout, &frame, path)?;
                println!("Final frame written to {}", path.display());
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("Result: {} (segment {})", result.label, result.position);
    }
    Ok(())
}

fn run_simulate(wheel: &Wheel, args: &SimulateArgs, rng: &mut Pcg32) -> Result<(), WheelError> {
    let expected = wheel.distribution()?.label_probabilities(&wheel.layout);
    let tally = wheel.tally(args.samples, rng)?;
    println!("{:<12} {:>8} {:>10} {:>10}", "label", "count", "observed", "expected");
    for label in wheel.layout.labels() {
        println!(
            "{:<12} {:>8} {:>9.2}% {:>9.2}%",
            label,
            tally.count(label),
            tally.frequency(label) * 100.0,
            expected.get(label).copied().unwrap_or(0.0) * 100.0
        );
    }
    println!("{} samples", tally.total());
    Ok(())
}

fn run_odds(wheel: &Wheel) -> Result<(), WheelError> {
    let probs = wheel.distribution()?.label_probabilities(&wheel.layout);
    println!("{:<12} {:>6} {:>7} {:>10}", "label", "slots", "weight", "chance");
    for label in wheel.layout.labels() {
        println!(
            "{:<12} {:>6} {:>7.1} {:>9.2}%",
            label,
            wheel.layout.occurrences(label),
            wheel.weights.get(label).unwrap_or(0.0),
            probs.get(label).copied().unwrap_or(0.0) * 100.0
        );
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = load_wheel(&cli).and_then(|wheel| {
        let mut rng = make_rng(cli.seed);
        match &cli.command {
            Commands::Spin(args) => run_spin(wheel, args, &mut rng),
            Commands::Simulate(args) => run_simulate(&wheel, args, &mut rng),
            Commands::Odds => run_odds(&wheel),
        }
    });

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
