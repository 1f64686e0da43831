use crate::time::{Clock, FrameClock, FrameTime, MonotonicClock};

/// A registered callback. Returning an error stops the scheduler.
pub type Callback<S> = Box<dyn FnMut(&mut S, &mut Tick) -> anyhow::Result<()>>;

/// Token identifying a registered callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CallbackId(u64);

#[derive(Debug, Copy, Clone, PartialEq)]
enum Command {
    Remove(CallbackId),
    SetFrequency(CallbackId, f64),
}

/// Handed to a callback for the duration of one invocation.
///
/// `remove` and `set_frequency` are buffered and applied once the callback
/// returns, so a callback may safely remove itself.
#[derive(Debug)]
pub struct Tick {
    id: CallbackId,
    now: f64,
    time: FrameTime,
    average_fps: f64,
    stop: bool,
    commands: Vec<Command>,
}

impl Tick {
    /// Id of the callback being invoked.
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Scheduler clock reading at invocation, in seconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Seconds since this callback last fired (zero on its first invocation).
    pub fn dt(&self) -> f64 {
        self.time.dt
    }

    /// How many times this callback fired before.
    pub fn frame_index(&self) -> u64 {
        self.time.frame_index
    }

    /// Mean invocation rate of this callback over its recent invocations.
    pub fn average_fps(&self) -> f64 {
        self.average_fps
    }

    /// Ends `Scheduler::go` once this callback returns.
    pub fn stop(&mut self) {
        self.stop = true;
    }

    pub fn remove(&mut self, id: CallbackId) {
        self.commands.push(Command::Remove(id));
    }

    pub fn set_frequency(&mut self, id: CallbackId, hz: f64) {
        self.commands.push(Command::SetFrequency(id, hz));
    }
}

struct Entry<S> {
    id: CallbackId,
    callback: Callback<S>,
    frequency: f64,
    last: f64,
    debt: f64,
    frames: FrameClock,
}

impl<S> Entry<S> {
    /// Accrues debt for the time since the last check and reports whether the
    /// callback fires now. Unpaid periods beyond one are dropped.
    fn due(&mut self, now: f64) -> bool {
        if self.frequency < 0.0 {
            return true;
        }
        self.debt += (now - self.last) * self.frequency;
        self.last = now;
        if self.debt >= 1.0 {
            self.debt = 0.0;
            true
        } else {
            false
        }
    }

    fn reset_timer(&mut self, now: f64) {
        self.last = now;
        self.debt = 0.0;
    }
}

/// Calls registered callbacks at independent target frequencies.
///
/// A negative frequency means "every pass". Callbacks run in registration
/// order on the calling thread and receive the shared state `S`.
pub struct Scheduler<S, C: Clock = MonotonicClock> {
    clock: C,
    entries: Vec<Entry<S>>,
    next_id: u64,
    running: bool,
}

impl<S> Scheduler<S> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl<S> Default for Scheduler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C: Clock> Scheduler<S, C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            entries: Vec::new(),
            next_id: 0,
            running: false,
        }
    }

    pub fn add_callback<F>(&mut self, callback: F, hz: f64) -> CallbackId
    where
        F: FnMut(&mut S, &mut Tick) -> anyhow::Result<()> + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            callback: Box::new(callback),
            frequency: hz,
            last: self.clock.now(),
            debt: 0.0,
            frames: FrameClock::new(),
        });
        log::trace!("scheduler: added {id:?} at {hz} Hz");
        id
    }

    /// Changes the target frequency and restarts the callback's timer.
    /// Returns `false` for an unknown id.
    pub fn replace_callback(&mut self, id: CallbackId, hz: f64) -> bool {
        let now = self.clock.now();
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.frequency = hz;
                entry.reset_timer(now);
                true
            }
            None => false,
        }
    }

    pub fn remove_callback(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn frequency(&self, id: CallbackId) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.frequency)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Runs passes over the callbacks until one calls [`Tick::stop`], one
    /// fails, or none remain. Timers restart when the loop starts.
    ///
    /// A callback error is returned unchanged.
    pub fn go(&mut self, state: &mut S) -> anyhow::Result<()> {
        let start = self.clock.now();
        for entry in &mut self.entries {
            entry.reset_timer(start);
        }

        self.running = true;
        log::debug!("scheduler: running {} callback(s)", self.entries.len());

        let result = self.run(state);
        self.running = false;
        result
    }

    fn run(&mut self, state: &mut S) -> anyhow::Result<()> {
        let mut ids = Vec::new();

        while self.running {
            if self.entries.is_empty() {
                log::debug!("scheduler: no callbacks left");
                return Ok(());
            }

            ids.clear();
            ids.extend(self.entries.iter().map(|e| e.id));

            let mut fired = false;
            for &id in &ids {
                // Entries may have been removed by an earlier callback this pass.
                let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
                    continue;
                };

                let now = self.clock.now();
                if !entry.due(now) {
                    continue;
                }
                fired = true;

                let time = entry.frames.begin_frame(now);
                let mut tick = Tick {
                    id,
                    now,
                    time,
                    average_fps: entry.frames.average_fps(),
                    stop: false,
                    commands: Vec::new(),
                };

                (entry.callback)(state, &mut tick)?;

                self.apply(&tick.commands);
                if tick.stop {
                    self.running = false;
                    return Ok(());
                }
            }

            if !fired {
                std::thread::yield_now();
            }
        }
        Ok(())
    }

    fn apply(&mut self, commands: &[Command]) {
        for command in commands {
            match *command {
                Command::Remove(id) => {
                    self.remove_callback(id);
                }
                Command::SetFrequency(id, hz) => {
                    self.replace_callback(id, hz);
                }
            }
        }
    }
}
