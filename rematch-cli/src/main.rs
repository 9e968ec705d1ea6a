use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::debug;
use rematch_core::{Flags, Regex, parse};

#[derive(Parser)]
#[command(name = "rematch")]
#[command(about = "Rematch - A leftmost-first regex engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Switches that map onto parse flags
#[derive(Args, Clone, Copy)]
struct FlagArgs {
    /// Case-insensitive matching
    #[arg(short = 'i', long)]
    ignore_case: bool,
    /// Let `.` match newline
    #[arg(short = 's', long)]
    dot_all: bool,
    /// Let `^` and `$` match at line boundaries
    #[arg(short = 'm', long)]
    multi_line: bool,
    /// Swap greedy and lazy repetition
    #[arg(short = 'U', long)]
    ungreedy: bool,
    /// POSIX syntax without Perl extensions
    #[arg(long)]
    posix: bool,
    /// Treat the pattern as literal text
    #[arg(long)]
    literal: bool,
}

impl FlagArgs {
    fn flags(self) -> Flags {
        let mut flags = if self.posix { Flags::POSIX } else { Flags::PERL };
        if self.ignore_case {
            flags |= Flags::FOLD_CASE;
        }
        if self.dot_all {
            flags |= Flags::DOT_NL;
        }
        if self.multi_line {
            flags -= Flags::ONE_LINE;
        }
        if self.ungreedy {
            flags |= Flags::NON_GREEDY;
        }
        if self.literal {
            flags |= Flags::LITERAL;
        }
        flags
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Test a regex pattern against input
    Test {
        /// The regex pattern
        pattern: String,
        /// The input string to test
        input: String,
        /// Show detailed match information
        #[arg(short, long)]
        verbose: bool,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Find all matches in input
    Find {
        /// The regex pattern
        pattern: String,
        /// The input string
        input: String,
        /// Stop after this many matches
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Check if pattern matches
    Match {
        /// The regex pattern
        pattern: String,
        /// The input string
        input: String,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Replace all matches using a `$1` / `${name}` template
    Replace {
        /// The regex pattern
        pattern: String,
        /// The input string
        input: String,
        /// The replacement template
        template: String,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Show how a pattern is parsed, compiled and executed
    Explain {
        /// The regex pattern
        pattern: String,
        /// Input used to pick the executor
        input: Option<String>,
        #[command(flatten)]
        flags: FlagArgs,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Test {
            pattern,
            input,
            verbose,
            flags,
        } => cmd_test(&pattern, &input, verbose, flags.flags()),
        Commands::Find {
            pattern,
            input,
            limit,
            flags,
        } => cmd_find(&pattern, &input, limit, flags.flags()),
        Commands::Match {
            pattern,
            input,
            flags,
        } => cmd_match(&pattern, &input, flags.flags()),
        Commands::Replace {
            pattern,
            input,
            template,
            flags,
        } => cmd_replace(&pattern, &input, &template, flags.flags()),
        Commands::Explain {
            pattern,
            input,
            flags,
        } => cmd_explain(&pattern, input.as_deref().unwrap_or(""), flags.flags()),
    }
}

fn compile_or_exit(pattern: &str, flags: Flags) -> Regex {
    debug!("compiling {pattern:?} with {flags:?}");
    match Regex::with_flags(pattern, flags) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_test(pattern: &str, input: &str, verbose: bool, flags: Flags) {
    println!("{}", "Testing pattern...".bold());
    println!("  Pattern: {}", pattern.cyan());
    println!("  Input:   {}", input.yellow());
    println!();

    let regex = compile_or_exit(pattern, flags);

    if let Some(caps) = regex.captures(input) {
        let Some(m) = caps.get(0) else {
            println!("{}", "✗ No match".red());
            return;
        };
        println!("{}", "✓ Match found!".green().bold());
        println!("  Position: {}..{}", m.start, m.end);
        println!("  Match:    {}", m.as_str(input).green());

        if verbose && caps.len() > 1 {
            println!();
            println!("{}", "Capture groups:".bold());
            for i in 1..caps.len() {
                let label = match &regex.subexp_names()[i] {
                    Some(name) => format!("{i} ({name})"),
                    None => i.to_string(),
                };
                match caps.get(i) {
                    Some(g) => println!(
                        "  Group {}: {}..{} = {}",
                        label,
                        g.start,
                        g.end,
                        g.as_str(input).green()
                    ),
                    None => println!("  Group {}: {}", label, "unset".dimmed()),
                }
            }
        }
    } else {
        println!("{}", "✗ No match".red());
    }
}

fn cmd_find(pattern: &str, input: &str, limit: Option<usize>, flags: Flags) {
    let regex = compile_or_exit(pattern, flags);

    let matches = regex.find_all(input, limit);

    if matches.is_empty() {
        println!("{}", "No matches found".red());
    } else {
        println!(
            "{} {}",
            "Found".bold(),
            format!("{} match(es)", matches.len()).green()
        );
        println!();

        for (i, m) in matches.iter().enumerate() {
            println!(
                "  [{}] {}..{} = {}",
                i + 1,
                m.start,
                m.end,
                m.as_str(input).green()
            );
        }
    }
}

fn cmd_match(pattern: &str, input: &str, flags: Flags) {
    let regex = compile_or_exit(pattern, flags);

    if regex.is_match(input) {
        println!("{}", "true".green());
        std::process::exit(0);
    } else {
        println!("{}", "false".red());
        std::process::exit(1);
    }
}

fn cmd_replace(pattern: &str, input: &str, template: &str, flags: Flags) {
    let regex = compile_or_exit(pattern, flags);
    println!("{}", regex.replace_all(input, template));
}

fn cmd_explain(pattern: &str, input: &str, flags: Flags) {
    let tree = match parse(pattern, flags) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let regex = compile_or_exit(pattern, flags);

    println!("{}", "Pattern:".bold());
    println!("  {}", pattern.cyan());
    println!("{}", "Parsed:".bold());
    println!("  {tree}");
    println!("{}", "Simplified:".bold());
    println!("  {}", tree.simplify());
    println!("{}", "Program:".bold());
    print!("{}", regex.prog());
    println!("{}", "Analysis:".bold());
    let (prefix, complete) = regex.literal_prefix();
    println!("  One-pass:       {}", yes_no(regex.is_onepass()));
    println!("  Literal prefix: {prefix:?} (complete: {})", yes_no(complete));
    println!("  Capture groups: {}", regex.num_subexp());
    println!(
        "  Executor:       {} (for {} bytes of input)",
        regex.strategy_for(input.len()).to_string().green(),
        input.len()
    );
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value { "yes".green() } else { "no".red() }
}
