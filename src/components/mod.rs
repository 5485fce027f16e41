//! ECS components for agents.
//!
//! This module groups the component types attached to agents and the plain
//! data types they are built from: sensors and actuators, the behavior state
//! machine, damage emitters and sensors, health, and the physical state an
//! agent perceives and drives.
//!
//! Submodules overview:
//! - [`actuator`] – effect producers run by behavior states
//! - [`agentcommand`] – side effects queued by behavior code for the systems
//! - [`animator`] – receiving end of animation commands
//! - [`behaviormachine`] – per-agent arena of states and sensors, and its driver
//! - [`behaviorstate`] – a behavior node: actuators, sensors and transitions
//! - [`boxcollider`] – axis-aligned box used by contact detection
//! - [`damageemitter`] – declarative damage descriptor
//! - [`damagesensor`] – sensor reporting contact with damage emitters
//! - [`easing`] – easing curves for accelerated movement
//! - [`eventsource`] – counted observer list shared by sensors
//! - [`life`] – health and damage accrual
//! - [`movement`] – horizontal and vertical movement actuators
//! - [`perception`] – what an agent knows about the world this frame
//! - [`rigidbody`] – simple kinematic body storing velocity
//! - [`sensor`] – gated condition watchers
//! - [`timer`] – countdown timer

pub mod actuator;
pub mod agentcommand;
pub mod animator;
pub mod behaviormachine;
pub mod behaviorstate;
pub mod boxcollider;
pub mod damageemitter;
pub mod damagesensor;
pub mod easing;
pub mod eventsource;
pub mod life;
pub mod movement;
pub mod perception;
pub mod rigidbody;
pub mod sensor;
pub mod timer;
