use log::{debug, info};

use crate::api::game::{Game, GameConfig, WorldContext};
use crate::api::types::GameEvent;
use crate::assets::manifest::DataError;
use crate::bridge::view::ViewBuffer;
use crate::core::time::FixedTimestep;
use crate::input::queue::{InputEvent, InputQueue};

/// Generic game runner that wires up the engine loop.
///
/// The host pushes input as it arrives and calls `tick` once per frame with
/// the elapsed wall time. The runner turns that into fixed simulation ticks,
/// handles level transitions between ticks and refreshes the view.
pub struct GameRunner<G: Game> {
    game: G,
    world: WorldContext,
    input: InputQueue,
    timestep: FixedTimestep,
    view: ViewBuffer,
    /// Events produced during the last host frame.
    events: Vec<GameEvent>,
    initialized: bool,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Result<Self, DataError> {
        let config = game.config();
        config.validate()?;
        let registry = game.definitions()?;
        info!("{} object definitions loaded", registry.object_count());
        let timestep = FixedTimestep::from_fps(config.fps_target);

        Ok(Self {
            game,
            world: WorldContext::new(config, registry),
            input: InputQueue::new(),
            timestep,
            view: ViewBuffer::new(),
            events: Vec::new(),
            initialized: false,
        })
    }

    /// Load the first level. Call once after construction.
    pub fn init(&mut self) -> Result<(), DataError> {
        let name = self.game.first_level();
        self.load(&name)?;
        self.view.rebuild(&self.world.scene, &self.world.camera, 0.0);
        self.initialized = true;
        Ok(())
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one host frame of `frame_seconds` wall time.
    ///
    /// Fails only if a requested level transition cannot be loaded; the
    /// current level then keeps running.
    pub fn tick(&mut self, frame_seconds: f32) -> Result<(), DataError> {
        if !self.initialized {
            return Ok(());
        }

        self.events.clear();
        for event in self.input.drain() {
            self.world.keys.apply(event);
        }

        let dt = self.timestep.dt() * self.world.config.fps_target;
        let steps = self.timestep.accumulate(frame_seconds);
        for _ in 0..steps {
            self.world.tick(dt);
            self.game.update(&mut self.world);
            self.world.keys.end_tick();
            self.events.append(&mut self.world.events);

            if let Some(name) = self.world.pending_level.take() {
                self.load(&name)?;
            }
        }

        self.view.rebuild(&self.world.scene, &self.world.camera, self.timestep.alpha());
        for entity in self.world.scene.iter_mut() {
            entity.requested_animation = None;
        }
        Ok(())
    }

    fn load(&mut self, name: &str) -> Result<(), DataError> {
        debug!("loading level {name:?}");
        let level = self.game.level(name)?;
        self.world.load_level(&level)?;
        self.timestep.reset();
        Ok(())
    }

    pub fn view(&self) -> &ViewBuffer {
        &self.view
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn world(&self) -> &WorldContext {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldContext {
        &mut self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.world.config
    }

    pub fn game(&self) -> &G {
        &self.game
    }
}
