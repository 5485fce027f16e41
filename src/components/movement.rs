//! Horizontal and vertical movement actuators.
//!
//! Both drive one component of the agent's velocity:
//! - constant speed, or a ramp from the initial speed to a goal speed over
//!   `interpolation_time` seconds shaped by an [`Easing`]
//! - optionally once on enter only ("throw"), leaving the rest to physics
//! - optionally steering towards a followed target
//! - optionally reacting to frontal collisions by bouncing or being destroyed
//!
//! Accelerated actuators seed their initial speed from the current velocity,
//! so chaining states keeps motion continuous.

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::actuator::{Actuator, ActuatorContext, ActuatorKind};
use super::agentcommand::AgentCommand;
use super::easing::Easing;
use super::perception::{Axis, ContactPhase, LayerMask};
use super::sensor::SensorId;
use crate::events::animation::{AnimationCmd, Facing};

/// What a movement actuator does when it hits something head-on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionReaction {
    #[default]
    None,
    Bounce,
    Destroy,
}

/// Speed over time for one movement axis.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedRamp {
    pub speed: f32,
    pub goal_speed: f32,
    pub interpolation_time: f32,
    pub accelerated: bool,
    pub easing: Easing,
    initial_speed: f32,
    time: f32,
}

impl SpeedRamp {
    pub fn constant(speed: f32) -> Self {
        SpeedRamp {
            speed,
            goal_speed: speed,
            interpolation_time: 0.0,
            accelerated: false,
            easing: Easing::Linear,
            initial_speed: speed,
            time: 0.0,
        }
    }

    pub fn accelerated(goal_speed: f32, interpolation_time: f32, easing: Easing) -> Self {
        SpeedRamp {
            speed: 0.0,
            goal_speed,
            interpolation_time: interpolation_time.max(0.0),
            accelerated: true,
            easing,
            initial_speed: 0.0,
            time: 0.0,
        }
    }

    /// Restart the ramp. `current` is the agent's speed along the axis.
    fn begin(&mut self, current: f32) {
        self.time = 0.0;
        if self.accelerated {
            self.speed = current.abs();
        }
        self.initial_speed = self.speed;
    }

    fn advance(&mut self, dt: f32) -> f32 {
        self.time += dt;
        if self.accelerated {
            let t = if self.interpolation_time > 0.0 {
                self.time / self.interpolation_time
            } else {
                1.0
            };
            self.speed = if t >= 1.0 {
                self.goal_speed
            } else {
                self.easing
                    .interpolate(self.initial_speed, self.goal_speed, t)
            };
        }
        self.speed
    }

    pub fn initial_speed(&self) -> f32 {
        self.initial_speed
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalDirection {
    #[default]
    Left,
    Right,
}

impl HorizontalDirection {
    fn sign(self) -> f32 {
        match self {
            HorizontalDirection::Left => -1.0,
            HorizontalDirection::Right => 1.0,
        }
    }

    fn flipped(self) -> Self {
        match self {
            HorizontalDirection::Left => HorizontalDirection::Right,
            HorizontalDirection::Right => HorizontalDirection::Left,
        }
    }

    fn facing(self) -> Facing {
        match self {
            HorizontalDirection::Left => Facing::Left,
            HorizontalDirection::Right => Facing::Right,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalDirection {
    #[default]
    Up,
    Down,
}

impl VerticalDirection {
    fn sign(self) -> f32 {
        match self {
            VerticalDirection::Up => 1.0,
            VerticalDirection::Down => -1.0,
        }
    }

    fn flipped(self) -> Self {
        match self {
            VerticalDirection::Up => VerticalDirection::Down,
            VerticalDirection::Down => VerticalDirection::Up,
        }
    }

    fn facing(self) -> Facing {
        match self {
            VerticalDirection::Up => Facing::Up,
            VerticalDirection::Down => Facing::Down,
        }
    }
}

/// Settings shared by both movement actuators.
#[derive(Clone, Debug)]
struct MovementCore {
    ramp: SpeedRamp,
    throw: bool,
    follow: Option<Entity>,
    reaction: CollisionReaction,
    layers: LayerMask,
    sensors: Vec<SensorId>,
    debug: bool,
    target_missing_logged: bool,
}

impl MovementCore {
    fn new(ramp: SpeedRamp) -> Self {
        MovementCore {
            ramp,
            throw: false,
            follow: None,
            reaction: CollisionReaction::None,
            layers: LayerMask::ALL,
            sensors: Vec::new(),
            debug: false,
            target_missing_logged: false,
        }
    }

    /// Position and half extents of the followed target, warning once per
    /// activation when it cannot be seen.
    fn followed(&mut self, ctx: &ActuatorContext, who: &str) -> Option<(Vec2, Vec2)> {
        let target = self.follow?;
        match ctx.perception.target(target) {
            Some(info) => Some((info.position, info.half_extents)),
            None => {
                if !self.target_missing_logged {
                    warn!(
                        "{} actuator on {:?}: followed target {:?} not perceived, keeping direction",
                        who, ctx.entity, target
                    );
                    self.target_missing_logged = true;
                }
                None
            }
        }
    }

    /// Normals of this frame's new contacts that this actuator reacts to.
    fn frontal_hits(&self, ctx: &ActuatorContext, axis: Axis) -> Vec<Vec2> {
        if self.reaction == CollisionReaction::None {
            return Vec::new();
        }
        ctx.perception
            .contacts
            .iter()
            .filter(|c| {
                c.phase == ContactPhase::Begin
                    && self.layers.contains(c.layer)
                    && axis.dominates(c.normal)
            })
            .map(|c| c.normal)
            .collect()
    }
}

macro_rules! movement_builders {
    () => {
        /// Apply the movement once on enter and leave the velocity alone
        /// afterwards.
        pub fn with_throw(mut self) -> Self {
            self.core.throw = true;
            self
        }

        pub fn following(mut self, target: Entity) -> Self {
            self.core.follow = Some(target);
            self
        }

        pub fn with_reaction(mut self, reaction: CollisionReaction, layers: LayerMask) -> Self {
            self.core.reaction = reaction;
            self.core.layers = layers;
            self
        }

        pub fn with_sensors(mut self, sensors: Vec<SensorId>) -> Self {
            self.core.sensors = sensors;
            self
        }

        pub fn set_follow(&mut self, target: Option<Entity>) {
            self.core.follow = target;
            self.core.target_missing_logged = false;
        }

        pub fn ramp(&self) -> &SpeedRamp {
            &self.core.ramp
        }

        pub fn speed(&self) -> f32 {
            self.core.ramp.speed
        }
    };
}

/// Drives `velocity.x`.
#[derive(Clone, Debug)]
pub struct HorizontalActuator {
    core: MovementCore,
    direction: HorizontalDirection,
}

impl HorizontalActuator {
    pub fn new(ramp: SpeedRamp, direction: HorizontalDirection) -> Self {
        HorizontalActuator {
            core: MovementCore::new(ramp),
            direction,
        }
    }

    movement_builders!();

    pub fn direction(&self) -> HorizontalDirection {
        self.direction
    }

    fn face(&self, ctx: &mut ActuatorContext) {
        let entity = ctx.entity;
        ctx.push(AgentCommand::Animate(AnimationCmd::Face {
            entity,
            direction: self.direction.facing(),
        }));
    }

    fn apply(&mut self, dt: f32, ctx: &mut ActuatorContext) {
        let previous = self.direction;
        if let Some((target, extents)) = self.core.followed(ctx, "horizontal") {
            let own = ctx.perception.position.x;
            // inside the target's width the direction is kept
            if own > target.x + extents.x {
                self.direction = HorizontalDirection::Left;
            } else if own < target.x - extents.x {
                self.direction = HorizontalDirection::Right;
            }
        }
        let speed = self.core.ramp.advance(dt);
        ctx.velocity.x = speed * self.direction.sign();
        if self.direction != previous {
            self.face(ctx);
        }
    }

    fn react(&mut self, ctx: &mut ActuatorContext) {
        for normal in self.core.frontal_hits(ctx, Axis::X) {
            match self.core.reaction {
                CollisionReaction::Bounce => {
                    let frontal = match self.direction {
                        HorizontalDirection::Left => normal.x > 0.0,
                        HorizontalDirection::Right => normal.x < 0.0,
                    };
                    if frontal {
                        self.direction = self.direction.flipped();
                        self.face(ctx);
                        if self.core.debug {
                            debug!("{:?} bounced, now moving {:?}", ctx.entity, self.direction);
                        }
                    }
                }
                CollisionReaction::Destroy => {
                    let entity = ctx.entity;
                    ctx.push(AgentCommand::Destroy { entity });
                    return;
                }
                CollisionReaction::None => {}
            }
        }
    }
}

impl Actuator for HorizontalActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Horizontal
    }

    fn sensors(&self) -> &[SensorId] {
        &self.core.sensors
    }

    fn enter(&mut self, ctx: &mut ActuatorContext) {
        self.core.target_missing_logged = false;
        self.core.ramp.begin(ctx.velocity.x);
        if let Some((target, _)) = self.core.followed(ctx, "horizontal") {
            self.direction = if target.x - ctx.perception.position.x > 0.0 {
                HorizontalDirection::Right
            } else {
                HorizontalDirection::Left
            };
        }
        if self.core.throw {
            self.apply(0.0, ctx);
        }
        self.face(ctx);
    }

    fn tick(&mut self, dt: f32, ctx: &mut ActuatorContext) {
        self.react(ctx);
        if !self.core.throw {
            self.apply(dt, ctx);
        }
    }

    fn set_debug(&mut self, debug: bool) {
        self.core.debug = debug;
    }
}

/// Drives `velocity.y`.
#[derive(Clone, Debug)]
pub struct VerticalActuator {
    core: MovementCore,
    direction: VerticalDirection,
}

impl VerticalActuator {
    pub fn new(ramp: SpeedRamp, direction: VerticalDirection) -> Self {
        VerticalActuator {
            core: MovementCore::new(ramp),
            direction,
        }
    }

    movement_builders!();

    pub fn direction(&self) -> VerticalDirection {
        self.direction
    }

    fn face(&self, ctx: &mut ActuatorContext) {
        let entity = ctx.entity;
        ctx.push(AgentCommand::Animate(AnimationCmd::Face {
            entity,
            direction: self.direction.facing(),
        }));
    }

    fn apply(&mut self, dt: f32, ctx: &mut ActuatorContext) {
        let previous = self.direction;
        if let Some((target, _)) = self.core.followed(ctx, "vertical") {
            self.direction = if target.y - ctx.perception.position.y > 0.0 {
                VerticalDirection::Up
            } else {
                VerticalDirection::Down
            };
        }
        let speed = self.core.ramp.advance(dt);
        ctx.velocity.y = speed * self.direction.sign();
        if self.core.ramp.accelerated {
            let (entity, value) = (ctx.entity, ctx.velocity.y);
            ctx.push(AgentCommand::Animate(AnimationCmd::SetSpeed {
                entity,
                axis: Axis::Y,
                value,
            }));
        }
        if self.direction != previous {
            self.face(ctx);
        }
    }

    fn react(&mut self, ctx: &mut ActuatorContext) {
        for normal in self.core.frontal_hits(ctx, Axis::Y) {
            match self.core.reaction {
                CollisionReaction::Bounce => {
                    let frontal = match self.direction {
                        VerticalDirection::Up => normal.y < 0.0,
                        VerticalDirection::Down => normal.y > 0.0,
                    };
                    if frontal {
                        self.direction = self.direction.flipped();
                        let entity = ctx.entity;
                        ctx.push(AgentCommand::Animate(AnimationCmd::Flip {
                            entity,
                            axis: Axis::Y,
                        }));
                        self.face(ctx);
                        if self.core.debug {
                            debug!("{:?} bounced, now moving {:?}", ctx.entity, self.direction);
                        }
                    }
                }
                CollisionReaction::Destroy => {
                    let entity = ctx.entity;
                    ctx.push(AgentCommand::Destroy { entity });
                    return;
                }
                CollisionReaction::None => {}
            }
        }
    }
}

impl Actuator for VerticalActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Vertical
    }

    fn sensors(&self) -> &[SensorId] {
        &self.core.sensors
    }

    fn enter(&mut self, ctx: &mut ActuatorContext) {
        self.core.target_missing_logged = false;
        self.core.ramp.begin(ctx.velocity.y);
        if let Some((target, _)) = self.core.followed(ctx, "vertical") {
            self.direction = if target.y - ctx.perception.position.y > 0.0 {
                VerticalDirection::Up
            } else {
                VerticalDirection::Down
            };
        }
        if self.core.throw {
            self.apply(0.0, ctx);
        }
        let entity = ctx.entity;
        ctx.push(AgentCommand::Animate(AnimationCmd::SetSpeed {
            entity,
            axis: Axis::Y,
            value: self.core.ramp.initial_speed(),
        }));
        self.face(ctx);
    }

    fn tick(&mut self, dt: f32, ctx: &mut ActuatorContext) {
        self.react(ctx);
        if !self.core.throw {
            self.apply(dt, ctx);
        }
    }

    fn set_debug(&mut self, debug: bool) {
        self.core.debug = debug;
    }
}
