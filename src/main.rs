use clap::{Parser, Subcommand};
use retouch::display::{LogDisplay, Viewport};
use retouch::imaging::{Quality, RustBackend};
use retouch::script::Step;
use retouch::session::Editor;
use retouch::{config, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Non-destructive photo editing sessions")]
#[command(long_about = "\
Non-destructive photo editing sessions

Load an image, run edit steps against it, and keep a linear undo/redo
history. The loaded file is never modified: every committed step is written
to an edits/ directory next to it.

Steps (repeat --step to run several, in order):

  grayscale | color | contrast | sharpen | blur | left | right | mirror
                               commit a filter, optional :<intensity> 0-100
  reset                        commit the original image again
  preview:<filter>[:<n>]       show a filter without committing
  discard                      drop the active preview
  crop:x,y,w,h                 crop the visible image
  resize:WxH                   resample to exactly W x H
  undo | redo                  move through history

Example:

  retouch edit photos/cat.png --step color:80 --step blur:20 --step undo \\
      --save-as photos/cat-final.jpg

A bare --save-as writes photos/edits/edited_cat.png (prefix from retouch.toml).

Run 'retouch gen-config' to generate a documented retouch.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing retouch.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the editable images in a directory
    List {
        /// Directory to list
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Load an image and run edit steps against it
    Edit {
        /// Image to edit
        image: PathBuf,
        /// Edit step, applied in order
        #[arg(long = "step", value_name = "STEP")]
        steps: Vec<Step>,
        /// Export the final image to this path. Without a path, writes a
        /// prefixed copy into the edits directory
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        save_as: Option<Option<PathBuf>>,
        /// Print the final session summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock retouch.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::List { dir } => {
            let editor = build_editor(&cli.config)?;
            let names = editor.list_images(&dir)?;
            output::print_listing(&dir, &names);
        }
        Command::Edit {
            image,
            steps,
            save_as,
            json,
        } => {
            let mut editor = build_editor(&cli.config)?;
            editor.load(&image)?;
            if !json {
                output::print_loaded(&editor.summary());
            }

            let mut failures = 0;
            for (i, step) in steps.iter().enumerate() {
                let result = step.apply(&mut editor);
                if result.is_err() {
                    failures += 1;
                }
                if !json {
                    output::print_step(i + 1, step, &result, &editor.summary());
                }
            }

            if let Some(target) = save_as {
                let path = match target {
                    Some(path) => {
                        editor.save_as(&path)?;
                        path
                    }
                    None => editor.save_as_suggested()?,
                };
                if !json {
                    output::print_saved(&path);
                }
            }

            let summary = editor.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_summary(&summary);
            }
            if failures > 0 {
                return Err(format!("{failures} step(s) failed").into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config from `dir` and wire the production backend and display.
fn build_editor(
    dir: &std::path::Path,
) -> Result<Editor<RustBackend, LogDisplay>, Box<dyn std::error::Error>> {
    let config = config::load_config(dir)?;
    let backend = RustBackend::with_quality(Quality::new(config.export.jpeg_quality));
    let display = LogDisplay::new(Viewport::from(&config.display));
    Ok(Editor::new(backend, display, config)?)
}
