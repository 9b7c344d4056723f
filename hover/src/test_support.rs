use std::cell::{Cell, RefCell};

use crate::host::{BodyFrame, ColliderLayers, SpringRay, RayHit, RayCaster};
use crate::layers::Layer;
use crate::types::{Pose, Quat, Vec3};

pub(crate) const VEHICLE_ID: u32 = 1;
pub(crate) const GROUND_ID: u32 = 100;

/// Infinite horizontal ground plane plus the layer bookkeeping of one vehicle.
pub(crate) struct FlatGround {
    pub height: Option<f32>,
    /// Report every hit as belonging to the vehicle itself.
    pub hits_self: bool,
    /// Panic on the n-th cast (1-based).
    pub panic_on_cast: Option<usize>,
    own_layers: Vec<Layer>,
    saved: Option<Vec<Layer>>,
    casts: Cell<usize>,
    /// Own-collider layers observed while each ray was cast.
    pub layers_during_cast: RefCell<Vec<Vec<Layer>>>,
}

impl FlatGround {
    pub(crate) fn at(height: f32) -> Self {
        Self {
            height: Some(height),
            hits_self: false,
            panic_on_cast: None,
            own_layers: vec![hull_layer(), hull_layer(), Layer::new(13).unwrap()],
            saved: None,
            casts: Cell::new(0),
            layers_during_cast: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn void() -> Self {
        Self {
            height: None,
            ..Self::at(0.0)
        }
    }

    pub(crate) fn casts(&self) -> usize {
        self.casts.get()
    }
}

pub(crate) fn hull_layer() -> Layer {
    Layer::new(12).unwrap()
}

impl RayCaster for FlatGround {
    type Identity = u32;

    fn cast(&self, ray: &SpringRay) -> Option<RayHit<u32>> {
        self.casts.set(self.casts.get() + 1);
        self.layers_during_cast
            .borrow_mut()
            .push(self.own_layers.clone());
        if self.panic_on_cast == Some(self.casts.get()) {
            panic!("ray cast failure");
        }

        let height = self.height?;
        if ray.direction.y >= 0.0 {
            return None;
        }
        let distance = (ray.origin.y - height) / -ray.direction.y;
        if !(0.0..=ray.max_distance).contains(&distance) {
            return None;
        }
        Some(RayHit {
            distance,
            owner: Some(if self.hits_self { VEHICLE_ID } else { GROUND_ID }),
        })
    }
}

impl ColliderLayers for FlatGround {
    fn set_own_colliders_to_layer(&mut self, layer: Layer) {
        self.saved = Some(self.own_layers.clone());
        self.own_layers.iter_mut().for_each(|l| *l = layer);
    }

    fn restore_own_collider_layers(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.own_layers = saved;
        }
    }

    fn own_collider_layers(&self) -> Vec<Layer> {
        self.own_layers.clone()
    }
}

/// Level body at `height`, at rest.
pub(crate) fn body_at(height: f32) -> BodyFrame<u32> {
    BodyFrame::capture(
        VEHICLE_ID,
        Pose::new(Vec3::new(0.0, height, 0.0), Quat::identity()),
        Vec3::zeros(),
        Vec3::zeros(),
        5.0,
    )
}

pub(crate) fn moving_body(local_velocity: Vec3, orientation: Quat) -> BodyFrame<u32> {
    BodyFrame::capture(
        VEHICLE_ID,
        Pose::new(Vec3::zeros(), orientation),
        orientation * local_velocity,
        Vec3::zeros(),
        5.0,
    )
}
