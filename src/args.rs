use clap::{Arg, ArgAction, Command};

/// Command-line definition for the `qlut` binary
pub fn build_cli() -> Command {
    Command::new("qlut")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Apply 256-entry byte lookup tables to raw u8 data")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("apply")
                .visible_alias("a")
                .about("Map every byte of a file through a lookup table")
                .arg(
                    Arg::new("table")
                        .help("Table file (exactly 256 bytes)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("input")
                        .help("Input file")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("output")
                        .help("Output file (may be the input file)")
                        .required(true)
                        .index(3),
                )
                .arg(
                    Arg::new("threads")
                        .short('t')
                        .long("threads")
                        .help("Number of CPU threads for computation (0 = auto-detect)")
                        .value_name("N")
                        .default_value("0"),
                )
                .arg(
                    Arg::new("no-parallel")
                        .long("no-parallel")
                        .help("Disable all parallel processing")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("chunk_size")
                        .long("chunk-size")
                        .help("Bytes per parallel work item")
                        .value_name("BYTES"),
                )
                .arg(
                    Arg::new("level")
                        .long("level")
                        .help("Force a lookup implementation")
                        .value_name("LEVEL")
                        .value_parser(["auto", "scalar", "portable", "ssse3", "avx2", "neon"])
                        .default_value("auto"),
                ),
        )
        .subcommand(
            Command::new("build")
                .visible_alias("b")
                .about("Build a quantized activation table")
                .arg(
                    Arg::new("activation")
                        .help("sigmoid, tanh, relu, leaky-relu or hard-sigmoid")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .help("Table file to write")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("in_scale")
                        .long("in-scale")
                        .help("Input quantization scale")
                        .value_name("SCALE")
                        .required(true),
                )
                .arg(
                    Arg::new("in_zero_point")
                        .long("in-zero-point")
                        .help("Input quantization zero point")
                        .value_name("ZP")
                        .default_value("0"),
                )
                .arg(
                    Arg::new("out_scale")
                        .long("out-scale")
                        .help("Output quantization scale")
                        .value_name("SCALE")
                        .required(true),
                )
                .arg(
                    Arg::new("out_zero_point")
                        .long("out-zero-point")
                        .help("Output quantization zero point")
                        .value_name("ZP")
                        .default_value("0"),
                )
                .arg(
                    Arg::new("alpha")
                        .long("alpha")
                        .help("Alpha for leaky-relu and hard-sigmoid")
                        .value_name("ALPHA"),
                )
                .arg(
                    Arg::new("beta")
                        .long("beta")
                        .help("Beta for hard-sigmoid")
                        .value_name("BETA"),
                ),
        )
        .subcommand(Command::new("info").about("Show the detected lookup implementation"))
}

pub fn parse_args() -> clap::ArgMatches {
    build_cli().get_matches()
}
