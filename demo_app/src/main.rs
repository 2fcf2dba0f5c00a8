//! Asteroid field demo
//!
//! Drives a scene for a fixed number of frames. Asteroids drift and expire
//! and are replaced as they go; a drift system tracks everything that has a
//! velocity.
//!
//! Usage: `asteroid_field [scene.toml|scene.ron]`

use std::rc::Rc;

use rand::Rng;
use scene_core::config::Config;
use scene_core::ecs::ComponentId;
use scene_core::physics::ColliderRegistry;
use scene_core::prelude::*;

const FRAMES: u64 = 240;
const FIELD_SIZE: f32 = 100.0;
const ASTEROID_TAG: i32 = 1;
const SHIP_TAG: i32 = 2;

/// Linear velocity in units per frame
struct Velocity(Vec2);
impl Component for Velocity {}

/// Destroys its entity after a number of updates
struct Lifetime {
    frames_left: u32,
}

impl Component for Lifetime {
    fn is_updatable(&self) -> bool {
        true
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        self.frames_left = self.frames_left.saturating_sub(1);
        if self.frames_left == 0 {
            log::debug!("'{}' expired", ctx.entity().name());
            ctx.destroy_entity();
        }
    }
}

/// Sprite drawn on a render layer
struct Sprite {
    layer: i32,
    depth: f32,
}

impl Renderable for Sprite {
    fn render_layer(&self) -> i32 {
        self.layer
    }

    fn set_render_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    fn layer_depth(&self) -> f32 {
        self.depth
    }

    fn set_layer_depth(&mut self, depth: f32) {
        self.depth = depth;
    }
}

impl Component for Sprite {
    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_renderable_mut(&mut self) -> Option<&mut dyn Renderable> {
        Some(self)
    }
}

/// Collects the velocity of every drifting entity once per frame
struct DriftSystem {
    state: SystemState,
    moves: Vec<(EntityId, Vec2)>,
}

impl DriftSystem {
    fn new(types: &ComponentTypeManager) -> Self {
        Self {
            state: SystemState::new(Matcher::empty().all(types, &[std::any::TypeId::of::<Velocity>()])),
            moves: Vec::new(),
        }
    }
}

impl EntitySystem for DriftSystem {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn begin(&mut self, _entities: &mut EntityList) {
        self.moves.clear();
    }

    fn process(&mut self, entities: &mut EntityList) {
        for &id in self.state.entities() {
            let Some(entity) = entities.get(id) else {
                continue;
            };
            if let Some(velocity) = entity.get_component::<Velocity>() {
                self.moves.push((id, entity.transform().position + velocity.0));
            }
        }
    }
}

fn spawn_asteroid(scene: &mut Scene, rng: &mut impl Rng, index: usize) -> EntityId {
    let position = Vec2::new(
        rng.gen_range(-FIELD_SIZE..FIELD_SIZE),
        rng.gen_range(-FIELD_SIZE..FIELD_SIZE),
    );
    let velocity = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
    let size = rng.gen_range(2.0..8.0);

    scene.add_entity(
        Entity::new(format!("asteroid-{index}"))
            .with_tag(ASTEROID_TAG)
            .with_update_order(10)
            .with_position(position)
            .with_component(Velocity(velocity))
            .with_component(Lifetime {
                frames_left: rng.gen_range(30..180),
            })
            .with_component(Sprite {
                layer: 1,
                depth: rng.gen_range(0.0..1.0),
            })
            .with_collider(BoxCollider::new(size, size)),
    )
}

fn load_config() -> SceneConfig {
    match std::env::args().nth(1) {
        Some(path) => match SceneConfig::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load scene config from {}: {}; using defaults", path, e);
                SceneConfig::new("asteroid-field")
            }
        },
        None => SceneConfig::new("asteroid-field"),
    }
}

fn main() -> Result<(), EcsError> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config();
    let asteroid_count = config.entity_capacity.min(32);
    let types = Rc::new(ComponentTypeManager::new());
    let mut scene = Scene::new(config, Rc::clone(&types))
        .with_broad_phase(Box::new(ColliderRegistry::new()));

    if let Err(e) = scene.add_processor(DriftSystem::new(&types)) {
        log::warn!("Running without drift system: {}", e);
    }

    let ship = scene.add_entity(
        Entity::new("ship")
            .with_tag(SHIP_TAG)
            .with_component(Sprite { layer: 0, depth: 0.0 })
            .with_collider(BoxCollider::new(4.0, 4.0)),
    );

    let mut rng = rand::thread_rng();
    let mut spawned = 0;
    for _ in 0..asteroid_count {
        spawn_asteroid(&mut scene, &mut rng, spawned);
        spawned += 1;
    }

    let ship_sprite: Option<ComponentId> = scene
        .entity(ship)
        .and_then(|e| e.components().find_id::<Sprite>());

    for frame in 0..FRAMES {
        scene.update();

        let moves = scene
            .processor_mut::<DriftSystem>()
            .map(|system| std::mem::take(&mut system.moves))
            .unwrap_or_default();
        for (id, position) in moves {
            scene.set_position(id, position)?;
        }

        // Keep the field populated
        let live_asteroids = scene.entities_with_tag(ASTEROID_TAG).len();
        for _ in live_asteroids..asteroid_count {
            spawn_asteroid(&mut scene, &mut rng, spawned);
            spawned += 1;
        }

        // Bring the ship to the front half way through
        if frame == FRAMES / 2 {
            if let Some(sprite) = ship_sprite {
                scene.set_render_layer(ship, sprite, -1)?;
            }
        }

        if frame % 60 == 0 {
            log::info!(
                "Frame {}: {} entities, {} renderables, {} colliders",
                frame,
                scene.entities().len(),
                scene.renderables().len(),
                scene.broad_phase().collider_count()
            );
        }
    }

    log::info!("Spawned {} asteroids over {} frames", spawned, FRAMES);
    scene.end();
    Ok(())
}
