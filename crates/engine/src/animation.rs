/// Frame-based clip. Looping clips wrap forever; one-shot clips hold their
/// last frame and report `is_done` once its interval has elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frame_count: usize,
    interval: f32,
    looping: bool,
    timer: f32,
    current_frame: usize,
    done: bool,
}

impl Animation {
    pub fn new(frame_count: usize, interval: f32, looping: bool) -> Self {
        Self {
            frame_count: frame_count.max(1),
            interval: interval.max(f32::EPSILON),
            looping,
            timer: 0.0,
            current_frame: 0,
            done: false,
        }
    }

    pub fn looping(frame_count: usize, interval: f32) -> Self {
        Self::new(frame_count, interval, true)
    }

    pub fn once(frame_count: usize, interval: f32) -> Self {
        Self::new(frame_count, interval, false)
    }

    pub fn still() -> Self {
        Self::new(1, 1.0, true)
    }

    pub fn update(&mut self, dt: f32) {
        if self.done || (self.looping && self.frame_count == 1) {
            return;
        }
        self.timer += dt;
        while self.timer >= self.interval && !self.done {
            self.timer -= self.interval;
            if self.current_frame + 1 < self.frame_count {
                self.current_frame += 1;
            } else if self.looping {
                self.current_frame = 0;
            } else {
                self.done = true;
            }
        }
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.current_frame = 0;
        self.done = false;
    }

    pub fn frame(&self) -> usize {
        self.current_frame
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Total playback time of one pass through the clip.
    pub fn duration(&self) -> f32 {
        self.frame_count as f32 * self.interval
    }
}
