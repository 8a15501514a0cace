use dotenv::dotenv;
use racetrack::agents::{Agent, DefaultObserver, LinearAgent, TabularAgent, TrainConfig, Trainer};
use racetrack::infra::TrackError;
use racetrack::render::{AsciiRenderer, TrajectoryRenderer};
use racetrack::track::{DRIVE_GRID, Env, FINISH_POSITIONS, TimeLimit, Track, registry};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn get_env_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("racetrack=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn load_config() -> TrainConfig {
    let episodes = get_env_var::<usize>("RACETRACK_EPISODES").unwrap_or(1000);
    let mut config = TrainConfig::with_episodes(episodes);

    if let Some(seed) = get_env_var("RACETRACK_SEED") {
        config.seed = seed;
    }
    if let Some(learning_rate) = get_env_var("RACETRACK_LEARNING_RATE") {
        config.agent.learning_rate = learning_rate;
    }
    if let Some(gamma) = get_env_var("RACETRACK_GAMMA") {
        config.agent.gamma = gamma;
    }
    if let Some(final_epsilon) = get_env_var("RACETRACK_FINAL_EPSILON") {
        config.agent.final_epsilon = final_epsilon;
    }
    config.log_dir = env::var("RACETRACK_LOG_DIR").ok().map(PathBuf::from);
    config
}

/// Train `agent`, then record one greedy lap
fn train_and_rollout<A: Agent>(
    trainer: &mut Trainer,
    env: &mut TimeLimit<Track>,
    agent: &mut A,
) -> Result<Vec<usize>, TrackError> {
    let mut observer = DefaultObserver::new(trainer.config().log_every);
    trainer.run(env, agent, &mut observer)?;
    Ok(trainer.rollout_greedy(env, agent))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let config = load_config();
    let agent_kind = env::var("RACETRACK_AGENT").unwrap_or_else(|_| "tabular".to_string());
    let enable_render = get_env_var::<bool>("RACETRACK_RENDER").unwrap_or(false);

    info!("Environment: {}", DRIVE_GRID.id);
    info!("Render enabled: {}", enable_render);

    let mut env = registry::make(DRIVE_GRID.id)?;
    let mut trainer = Trainer::new(config.clone())?;

    let trajectory = match agent_kind.as_str() {
        "tabular" => {
            let mut agent = TabularAgent::new(config.agent, config.seed);
            train_and_rollout(&mut trainer, &mut env, &mut agent)?
        }
        "linear" => {
            let mut agent = LinearAgent::new(config.agent, env.mask().clone(), config.seed);
            train_and_rollout(&mut trainer, &mut env, &mut agent)?
        }
        #[cfg(feature = "autodiff")]
        "linear-autodiff" => {
            use racetrack::agents::{AutodiffNdArray, BurnGradient};

            let gradient = BurnGradient::<AutodiffNdArray>::new(Default::default());
            let mut agent =
                LinearAgent::with_gradient(config.agent, env.mask().clone(), gradient, config.seed);
            train_and_rollout(&mut trainer, &mut env, &mut agent)?
        }
        other => {
            return Err(format!("Unknown agent '{}' (expected tabular or linear)", other).into());
        }
    };

    let finished = trajectory
        .last()
        .is_some_and(|position| FINISH_POSITIONS.contains(position));
    info!(
        "Greedy rollout: {} steps, finished: {}",
        trajectory.len() - 1,
        finished
    );
    info!("Trajectory: {:?}", trajectory);

    if enable_render {
        let mut renderer = AsciiRenderer::stdout().with_frame_delay(Duration::from_millis(150));
        renderer.render(&trajectory);
    }

    Ok(())
}
