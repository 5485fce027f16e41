//! Animation state of an agent, as seen by the behavior engine.
//!
//! The [`Animator`] is the receiving end of [`AnimationCmd`] messages: it
//! keeps the facing flags, sprite flips, speed parameters and queued clip
//! triggers that a renderer would read. Agents without an animator (or with
//! a disabled one) are destroyed immediately instead of playing a death clip.

use bevy_ecs::prelude::Component;
use glam::Vec2;

use super::perception::Axis;
use super::timer::Timer;
use crate::events::animation::{AnimationClip, AnimationCmd, Facing};

#[derive(Component, Clone, Debug)]
pub struct Animator {
    pub enabled: bool,
    pub can_flip_x: bool,
    pub can_flip_y: bool,
    pub horizontal: Option<Facing>,
    pub vertical: Option<Facing>,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Speed parameters fed to the animation blend, per axis.
    pub speed: Vec2,
    triggers: Vec<AnimationClip>,
    die_duration: f32,
    dying: Option<Timer>,
}

impl Default for Animator {
    fn default() -> Self {
        Animator::new(0.0)
    }
}

impl Animator {
    /// `die_duration` is how long the death clip plays before the entity
    /// is despawned.
    pub fn new(die_duration: f32) -> Self {
        Animator {
            enabled: true,
            can_flip_x: true,
            can_flip_y: true,
            horizontal: None,
            vertical: None,
            flip_x: false,
            flip_y: false,
            speed: Vec2::ZERO,
            triggers: Vec::new(),
            die_duration,
            dying: None,
        }
    }

    pub fn with_flips(mut self, can_flip_x: bool, can_flip_y: bool) -> Self {
        self.can_flip_x = can_flip_x;
        self.can_flip_y = can_flip_y;
        self
    }

    pub fn is_dying(&self) -> bool {
        self.dying.is_some()
    }

    /// Apply a command. Disabled animators ignore everything.
    pub fn apply(&mut self, cmd: &AnimationCmd) {
        if !self.enabled {
            return;
        }
        match *cmd {
            AnimationCmd::Face { direction, .. } => match direction {
                Facing::Left | Facing::Right => {
                    if self.can_flip_x {
                        self.flip_x = direction == Facing::Left;
                    }
                    self.horizontal = Some(direction);
                }
                Facing::Up | Facing::Down => self.vertical = Some(direction),
            },
            AnimationCmd::Flip { axis, .. } => match axis {
                Axis::X if self.can_flip_x => self.flip_x = !self.flip_x,
                Axis::Y if self.can_flip_y => self.flip_y = !self.flip_y,
                _ => {}
            },
            AnimationCmd::Play { clip, .. } => {
                match clip {
                    AnimationClip::ChangeState => {
                        self.horizontal = None;
                        self.vertical = None;
                    }
                    AnimationClip::Die if self.dying.is_none() => {
                        let mut timer = Timer::new(self.die_duration);
                        timer.start();
                        self.dying = Some(timer);
                    }
                    _ => {}
                }
                self.triggers.push(clip);
            }
            AnimationCmd::SetSpeed { axis, value, .. } => match axis {
                Axis::X => self.speed.x = value,
                Axis::Y => self.speed.y = value,
            },
        }
    }

    /// Advance the death clip. Returns true once it has finished.
    pub fn tick_death(&mut self, dt: f32) -> bool {
        match &mut self.dying {
            Some(timer) => {
                timer.tick(dt);
                timer.is_expired()
            }
            None => false,
        }
    }

    /// Clip triggers queued since the last drain, oldest first.
    pub fn drain_triggers(&mut self) -> Vec<AnimationClip> {
        std::mem::take(&mut self.triggers)
    }
}
