//! Cooperative timed sequences (waits, property tweens, continuations)
//! advanced once per simulation tick against a world value.

mod easing;

use std::collections::VecDeque;
use std::fmt::Debug;

use tracing::debug;

pub use easing::Easing;

/// Numeric properties a sequence may tween. Reads return `None` once the
/// owning object is gone, which abandons any sequence addressing it.
pub trait TweenTarget {
    type Property: Copy + Debug;

    fn read(&self, property: Self::Property) -> Option<f32>;
    fn write(&mut self, property: Self::Property, value: f32) -> bool;
}

type Continuation<W> = Box<dyn FnOnce(&mut W)>;
type Guard<W> = Box<dyn Fn(&W) -> bool>;

enum Step<W: TweenTarget> {
    Wait {
        seconds: f32,
    },
    Tween {
        deltas: Vec<(W::Property, f32)>,
        seconds: f32,
        easing: Easing,
    },
    Then(Continuation<W>),
}

struct Track<P> {
    property: P,
    start: f32,
    delta: f32,
}

enum ActiveStep<P> {
    Wait {
        elapsed: f32,
        seconds: f32,
    },
    Tween {
        tracks: Vec<Track<P>>,
        elapsed: f32,
        seconds: f32,
        easing: Easing,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    Running,
    Finished,
    Abandoned,
}

/// An ordered script of steps with its own cursor.
pub struct Sequence<W: TweenTarget> {
    label: &'static str,
    steps: VecDeque<Step<W>>,
    active: Option<ActiveStep<W::Property>>,
    guard: Option<Guard<W>>,
}

impl<W: TweenTarget> Sequence<W> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            steps: VecDeque::new(),
            active: None,
            guard: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn wait(mut self, seconds: f32) -> Self {
        self.steps.push_back(Step::Wait { seconds });
        self
    }

    /// Moves each property by its delta from the value it has when the step begins.
    pub fn tween(
        mut self,
        deltas: impl IntoIterator<Item = (W::Property, f32)>,
        seconds: f32,
        easing: Easing,
    ) -> Self {
        self.steps.push_back(Step::Tween {
            deltas: deltas.into_iter().collect(),
            seconds,
            easing,
        });
        self
    }

    pub fn then(mut self, action: impl FnOnce(&mut W) + 'static) -> Self {
        self.steps.push_back(Step::Then(Box::new(action)));
        self
    }

    /// Checked before every resume; once false the sequence is dropped untouched.
    pub fn while_relevant(mut self, guard: impl Fn(&W) -> bool + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Advances by one tick. A timed step consumes at most `dt`; continuations
    /// that follow a completed step run in the same tick.
    pub fn advance(&mut self, world: &mut W, dt: f32) -> SequenceStatus {
        let mut consumed = false;
        loop {
            if let Some(guard) = &self.guard {
                if !guard(world) {
                    return SequenceStatus::Abandoned;
                }
            }

            if self.active.is_none() {
                match self.steps.pop_front() {
                    None => return SequenceStatus::Finished,
                    Some(Step::Then(action)) => {
                        action(world);
                        continue;
                    }
                    Some(Step::Wait { seconds }) => {
                        if seconds > 0.0 {
                            self.active = Some(ActiveStep::Wait {
                                elapsed: 0.0,
                                seconds,
                            });
                        }
                        continue;
                    }
                    Some(Step::Tween {
                        deltas,
                        seconds,
                        easing,
                    }) => {
                        let mut tracks = Vec::with_capacity(deltas.len());
                        for (property, delta) in deltas {
                            let Some(start) = world.read(property) else {
                                return SequenceStatus::Abandoned;
                            };
                            tracks.push(Track {
                                property,
                                start,
                                delta,
                            });
                        }
                        if seconds <= 0.0 {
                            if !write_tracks(world, &tracks, 1.0) {
                                return SequenceStatus::Abandoned;
                            }
                        } else {
                            self.active = Some(ActiveStep::Tween {
                                tracks,
                                elapsed: 0.0,
                                seconds,
                                easing,
                            });
                        }
                        continue;
                    }
                }
            }

            if consumed {
                return SequenceStatus::Running;
            }
            consumed = true;

            let finished = match self.active.as_mut() {
                Some(ActiveStep::Wait { elapsed, seconds }) => {
                    *elapsed += dt;
                    *elapsed >= *seconds
                }
                Some(ActiveStep::Tween {
                    tracks,
                    elapsed,
                    seconds,
                    easing,
                }) => {
                    *elapsed += dt;
                    let done = *elapsed >= *seconds;
                    let progress = if done {
                        1.0
                    } else {
                        easing.apply(*elapsed / *seconds)
                    };
                    if !write_tracks(world, tracks, progress) {
                        return SequenceStatus::Abandoned;
                    }
                    done
                }
                None => false,
            };
            if finished {
                self.active = None;
            } else {
                return SequenceStatus::Running;
            }
        }
    }
}

fn write_tracks<W: TweenTarget>(world: &mut W, tracks: &[Track<W::Property>], progress: f32) -> bool {
    tracks.iter().all(|track| {
        let value = if progress >= 1.0 {
            track.start + track.delta
        } else {
            track.start + track.delta * progress
        };
        world.write(track.property, value)
    })
}

/// Runs every live sequence once per tick in start order.
pub struct Timer<W: TweenTarget> {
    sequences: Vec<Sequence<W>>,
}

impl<W: TweenTarget> Default for Timer<W> {
    fn default() -> Self {
        Self {
            sequences: Vec::new(),
        }
    }
}

impl<W: TweenTarget> Timer<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, sequence: Sequence<W>) {
        self.sequences.push(sequence);
    }

    pub fn adopt(&mut self, sequences: impl IntoIterator<Item = Sequence<W>>) {
        self.sequences.extend(sequences);
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn clear(&mut self) {
        self.sequences.clear();
    }

    pub fn update(&mut self, world: &mut W, dt: f32) {
        self.sequences
            .retain_mut(|sequence| match sequence.advance(world, dt) {
                SequenceStatus::Running => true,
                SequenceStatus::Finished => false,
                SequenceStatus::Abandoned => {
                    debug!(sequence = sequence.label(), "sequence_abandoned");
                    false
                }
            });
    }
}
