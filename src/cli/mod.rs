use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "dynarray")]
#[command(version, about = "Drives DynamicArray through its growth and shrink scenarios", long_about = None)]
pub struct Cli {
    /// Number of pushes in the growth trace
    #[arg(short, long, value_name = "N", default_value_t = 16)]
    pub pushes: usize,

    /// Run the built-in scenario checks instead of the trace
    #[arg(short, long)]
    pub test: bool,

    /// Set verbose level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level implied by the number of `-v` flags.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
