use crate::error::HostError;
use murmur_data::{EffectKind, ExternalId, Vec3};
use serde::Serialize;
use std::collections::BTreeMap;

/// Host-side operations on visible effect objects.
///
/// The pool never assumes a handle stays valid between calls: the host may
/// destroy objects on its own, so [`is_valid`](Self::is_valid) is checked
/// before each touch.
pub trait EffectHost {
    /// Creates a visible effect and returns its id.
    fn spawn(&mut self, kind: EffectKind, position: Vec3, rotation: Vec3)
        -> Result<ExternalId, HostError>;

    fn move_to(&mut self, id: ExternalId, position: Vec3, rotation: Vec3) -> Result<(), HostError>;

    fn set_visible(&mut self, id: ExternalId, visible: bool) -> Result<(), HostError>;

    fn destroy(&mut self, id: ExternalId) -> Result<(), HostError>;

    fn is_valid(&self, id: ExternalId) -> bool;
}

/// State of one object held by a [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HostObject {
    pub kind: EffectKind,
    pub position: Vec3,
    pub rotation: Vec3,
    pub visible: bool,
}

/// Number of calls a [`RecordingHost`] has received, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostCalls {
    pub spawn: u64,
    pub move_to: u64,
    pub set_visible: u64,
    pub destroy: u64,
}

/// In-memory host that records every object and call.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    objects: BTreeMap<ExternalId, HostObject>,
    next_id: u64,
    spawn_limit: Option<usize>,
    calls: HostCalls,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that rejects spawns once `limit` objects exist.
    pub fn with_spawn_limit(limit: usize) -> Self {
        Self {
            spawn_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Drops an object behind the pool's back, as a host might on its own.
    pub fn invalidate(&mut self, id: ExternalId) -> bool {
        self.objects.remove(&id).is_some()
    }

    pub fn object(&self, id: ExternalId) -> Option<&HostObject> {
        self.objects.get(&id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn visible_count(&self) -> usize {
        self.objects.values().filter(|o| o.visible).count()
    }

    pub fn calls(&self) -> HostCalls {
        self.calls
    }

    fn object_mut(&mut self, id: ExternalId) -> Result<&mut HostObject, HostError> {
        self.objects
            .get_mut(&id)
            .ok_or(HostError::UnknownHandle(id))
    }
}

impl EffectHost for RecordingHost {
    fn spawn(
        &mut self,
        kind: EffectKind,
        position: Vec3,
        rotation: Vec3,
    ) -> Result<ExternalId, HostError> {
        self.calls.spawn += 1;
        if let Some(limit) = self.spawn_limit {
            if self.objects.len() >= limit {
                return Err(HostError::SpawnRejected(format!(
                    "object limit {limit} reached"
                )));
            }
        }
        self.next_id += 1;
        let id = ExternalId(self.next_id);
        self.objects.insert(
            id,
            HostObject {
                kind,
                position,
                rotation,
                visible: true,
            },
        );
        Ok(id)
    }

    fn move_to(&mut self, id: ExternalId, position: Vec3, rotation: Vec3) -> Result<(), HostError> {
        self.calls.move_to += 1;
        let object = self.object_mut(id)?;
        object.position = position;
        object.rotation = rotation;
        Ok(())
    }

    fn set_visible(&mut self, id: ExternalId, visible: bool) -> Result<(), HostError> {
        self.calls.set_visible += 1;
        self.object_mut(id)?.visible = visible;
        Ok(())
    }

    fn destroy(&mut self, id: ExternalId) -> Result<(), HostError> {
        self.calls.destroy += 1;
        self.objects
            .remove(&id)
            .map(|_| ())
            .ok_or(HostError::UnknownHandle(id))
    }

    fn is_valid(&self, id: ExternalId) -> bool {
        self.objects.contains_key(&id)
    }
}
