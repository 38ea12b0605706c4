use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "treetally")]
#[command(bin_name = "treetally")]
#[command(version)]
#[command(about = "Record tree measurements and photos for field surveys")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Write a diagnostics log under ~/.config/treetally/diagnostics"
    )]
    pub diagnostics: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Run environment and configuration checks")]
    Doctor,
    #[command(about = "Record a tree without the interactive screens")]
    Submit(SubmitArgs),
    #[command(subcommand, about = "Show or change the stored student details")]
    Details(DetailsCommand),
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    #[arg(long, help = "Tree identifier")]
    pub tree_id: String,
    #[arg(long, value_name = "COUNT", help = "Number of primary stems")]
    pub stems: String,
    #[arg(
        long = "stem",
        value_name = "HEIGHT:DIAMETER",
        help = "Measurements for one stem, repeated in stem order"
    )]
    pub stem: Vec<String>,
    #[arg(long, help = "Photo of the tree")]
    pub image: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum DetailsCommand {
    #[command(about = "Print the student details stored for the signed-in user")]
    Show,
    #[command(about = "Store student details for the signed-in user")]
    Set {
        #[arg(long)]
        name: String,
        #[arg(long)]
        roll_no: String,
        #[arg(long)]
        group: String,
    },
}
