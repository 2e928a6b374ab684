mod camera;
mod cli;
mod install;
mod shell;

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    sync::Arc,
};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use log::warn;
use visor_actors::{ActorManager, HeadlessScene, SceneBackend};
use visor_assets::AssetResolver;

use crate::camera::{CameraController, DEFAULT_WINDOW};
use crate::install::Resolution;
use crate::shell::{Flow, Shell};

fn main() -> Result<()> {
    let args = cli::Args::parse();

    env_logger::init();

    args.validate()?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let mount = match install::resolve(&args.install_options(), &mut input, &mut output)? {
        Resolution::Mounted(mount) => mount,
        Resolution::Cancelled => {
            println!("No install directory chosen; exiting.");
            return Ok(());
        }
    };
    println!(
        "Mounted {} phase folder(s) from {}",
        mount.mounted().len(),
        mount.root().display()
    );
    if !mount.missing().is_empty() {
        warn!("phases not found: {}", mount.missing().join(", "));
    }

    let assets: Arc<dyn AssetResolver> = Arc::new(mount);
    let roster = cli::load_roster(args.roster.as_deref(), assets.as_ref())?;
    ensure!(!roster.is_empty(), "roster lists no actors");

    let scene = HeadlessScene::new(Arc::clone(&assets))
        .with_default_timing(args.frame_count, args.frame_rate);
    let mut manager = ActorManager::new(scene).context("preparing the actor manager")?;
    let camera = CameraController::attach(manager.scene_mut(), DEFAULT_WINDOW);
    let mut shell = Shell::new(manager, roster, camera);

    shell
        .start(args.start.as_deref())
        .context("showing the first actor")?;
    print_notices(&mut shell);

    match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening command script {}", path.display()))?;
            run_commands(&mut shell, BufReader::new(file))
        }
        None => run_commands(&mut shell, input),
    }
}

fn run_commands<S, R>(shell: &mut Shell<S>, reader: R) -> Result<()>
where
    S: SceneBackend,
    R: BufRead,
{
    for line in reader.lines() {
        let line = line.context("reading viewer commands")?;
        let flow = match shell.handle(&line) {
            Ok(flow) => flow,
            Err(err) => {
                println!("{err}");
                Flow::Continue
            }
        };
        print_notices(shell);
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}

fn print_notices<S: SceneBackend>(shell: &mut Shell<S>) {
    for notice in shell.take_notices() {
        println!("{notice}");
    }
}
