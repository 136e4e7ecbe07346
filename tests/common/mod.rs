use murmur_core::config::SimConfig;
use murmur_core::host::RecordingHost;
use murmur_core::scheduler::{Destructor, Updater};
use murmur_core::Simulation;
use murmur_data::Vec3;
use std::cell::Cell;
use std::rc::Rc;

#[allow(dead_code)]
pub struct SimBuilder {
    config: SimConfig,
    entities: Vec<(Vec3, Vec3)>,
    host: RecordingHost,
}

#[allow(dead_code)]
impl SimBuilder {
    /// Empty swarm, fixed seed.
    pub fn new() -> Self {
        let mut config = SimConfig::default();
        config.swarm.initial_entities = 0;
        config.swarm.seed = Some(7);
        Self {
            config,
            entities: Vec::new(),
            host: RecordingHost::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.swarm.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_entity(mut self, position: Vec3, velocity: Vec3) -> Self {
        self.entities.push((position, velocity));
        self
    }

    pub fn with_host(mut self, host: RecordingHost) -> Self {
        self.host = host;
        self
    }

    /// Only the attractor acts; neighbor forces are zeroed.
    pub fn attractor_only(self) -> Self {
        self.with_config(|c| {
            c.forces.separation_weight = 0.0;
            c.forces.alignment_weight = 0.0;
            c.forces.cohesion_weight = 0.0;
        })
    }

    pub fn build(self) -> Simulation<RecordingHost> {
        let mut sim = Simulation::new(self.config, self.host).expect("test config must be valid");
        for (position, velocity) in self.entities {
            sim.spawn_entity(position, velocity);
        }
        sim
    }
}

/// Updater that counts its runs in `counter`.
#[allow(dead_code)]
pub fn counting<C: 'static>(counter: &Rc<Cell<u32>>) -> Updater<C> {
    let counter = Rc::clone(counter);
    Box::new(move |_: &mut C| {
        counter.set(counter.get() + 1);
        Ok(())
    })
}

#[allow(dead_code)]
pub fn counting_destructor(counter: &Rc<Cell<u32>>) -> Destructor {
    let counter = Rc::clone(counter);
    Box::new(move || counter.set(counter.get() + 1))
}

#[allow(dead_code)]
pub fn counters(n: usize) -> Vec<Rc<Cell<u32>>> {
    (0..n).map(|_| Rc::new(Cell::new(0))).collect()
}
