use anyhow::Context;

use diorama::{DioramaApp, SceneConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = SceneConfig::from_args(std::env::args()).context("failed to load the scene config")?;
    let app = DioramaApp::new(config);
    let frames = app.run().context("diorama stopped with an error")?;

    log::info!("exited cleanly after {} frames", frames);
    Ok(())
}
