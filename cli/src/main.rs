use clap::Parser;
use shape2schema::{dummy_schema, SchemaWriter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Path to the shapes file (Turtle)
    #[arg(short, long, value_name = "FILE")]
    shapes_file: PathBuf,
}

#[derive(Parser)]
struct ClassArgs {
    #[clap(flatten)]
    common: CommonArgs,

    /// IRI of the class graph to compile
    #[arg(long, value_name = "IRI")]
    class: String,

    /// Language tag for titles and descriptions
    #[arg(long, default_value = "en")]
    lang: String,
}

#[derive(Parser)]
struct ModelArgs {
    #[clap(flatten)]
    common: CommonArgs,

    /// IRI of the model graph to compile
    #[arg(long, value_name = "IRI")]
    model: String,

    /// Language tag for titles and descriptions
    #[arg(long, default_value = "en")]
    lang: String,
}

#[derive(Parser)]
struct MultilingualArgs {
    #[clap(flatten)]
    common: CommonArgs,

    /// IRI of the model graph to compile
    #[arg(long, value_name = "IRI")]
    model: String,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Compile a standalone JSON Schema document for one class
    Class(ClassArgs),
    /// Compile a JSON Schema document for a whole model
    Model(ModelArgs),
    /// Compile a multilingual JSON Schema document for a whole model
    Multilingual(MultilingualArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Class(args) => {
            let writer = SchemaWriter::from_file(&args.common.shapes_file)?;
            // Resources that yield no schema fall back to the dummy document.
            match writer.class_schema(&args.class, &args.lang)? {
                Some(schema) => println!("{}", schema),
                None => println!("{}", dummy_schema()),
            }
        }
        Commands::Model(args) => {
            let writer = SchemaWriter::from_file(&args.common.shapes_file)?;
            let schema = writer
                .model_schema(&args.model, &args.lang)?
                .ok_or_else(|| format!("no schema produced for model {}", args.model))?;
            println!("{}", schema);
        }
        Commands::Multilingual(args) => {
            let writer = SchemaWriter::from_file(&args.common.shapes_file)?;
            let schema = writer
                .multilingual_model_schema(&args.model)?
                .ok_or_else(|| format!("no schema produced for model {}", args.model))?;
            println!("{}", schema);
        }
    }
    Ok(())
}
