//! Main simulation engine interface.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, trace, warn};

use super::command::Command;
use super::scheduler::{Event, EventQueue};
use crate::circuit::{Circuit, Node, NodeId, PinRef};
use crate::error::{GatesimError, Result};

/// Configuration for the simulation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long the background loop waits for new work before re-checking
    /// whether it should stop.
    pub idle_wait: Duration,
    /// Ticks charged for every hop from an output pin to an input pin.
    pub gate_delay: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_millis(10),
            gate_delay: 1,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle wait of the background loop.
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Set the propagation delay per hop, in ticks.
    pub fn with_gate_delay(mut self, gate_delay: u64) -> Self {
        self.gate_delay = gate_delay;
        self
    }
}

/// Work waiting for the engine.
#[derive(Debug, Default)]
struct Inbox {
    commands: VecDeque<Command>,
    events: EventQueue,
}

enum Work {
    Command(Command),
    Event(Event),
}

/// State shared between the engine, its handles and the background loop.
///
/// The circuit and the inbox have separate locks and are never held at the
/// same time.
#[derive(Debug)]
struct Shared {
    circuit: Mutex<Circuit>,
    inbox: Mutex<Inbox>,
    wake: Condvar,
    running: AtomicBool,
    gate_delay: u64,
}

impl Shared {
    fn schedule(&self, nodes: &[NodeId], delay: u64) {
        if nodes.is_empty() {
            return;
        }
        let mut inbox = self.inbox.lock();
        for &node in nodes {
            inbox.events.schedule(node, delay);
        }
        self.wake.notify_one();
    }

    fn submit(&self, command: Command) {
        self.inbox.lock().commands.push_back(command);
        self.wake.notify_one();
    }

    /// Commands go first, in submission order; then the earliest event.
    fn next_work(&self) -> Option<Work> {
        let mut inbox = self.inbox.lock();
        if let Some(command) = inbox.commands.pop_front() {
            return Some(Work::Command(command));
        }
        inbox.events.pop().map(Work::Event)
    }

    /// Process one unit of work. Returns true if it was an event.
    fn process(&self, work: Work) -> bool {
        match work {
            Work::Command(command) => {
                trace!(?command, "applying command");
                let result = command.apply(&mut self.circuit.lock());
                match result {
                    Ok(touched) => self.schedule(&touched, 0),
                    Err(e) => warn!(error = %e, "command rejected"),
                }
                false
            }
            Work::Event(event) => {
                trace!(node = %event.node, time = event.time, "processing event");
                let result = self.circuit.lock().update(event.node);
                match result {
                    Ok(propagation) => self.schedule(&propagation.driven, self.gate_delay),
                    // node removed after the event was queued
                    Err(GatesimError::NodeNotFound { node }) => {
                        debug!(%node, "dropping event for removed node")
                    }
                    Err(e) => error!(node = %event.node, error = %e, "node evaluation failed"),
                }
                true
            }
        }
    }

    fn wait_for_work(&self, timeout: Duration) {
        let mut inbox = self.inbox.lock();
        if inbox.commands.is_empty()
            && inbox.events.is_empty()
            && self.running.load(Ordering::Acquire)
        {
            self.wake.wait_for(&mut inbox, timeout);
        }
    }

    fn run(&self, idle_wait: Duration) {
        info!("simulation loop started");
        while self.running.load(Ordering::Acquire) {
            match self.next_work() {
                Some(work) => {
                    self.process(work);
                }
                None => self.wait_for_work(idle_wait),
            }
        }
        info!("simulation loop stopped");
    }
}

/// A cloneable handle for scheduling work on an engine from any thread.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    /// Schedule `node` for re-evaluation `delay` ticks from now.
    pub fn queue_update(&self, node: NodeId, delay: u64) {
        self.shared.schedule(&[node], delay);
    }

    /// Re-evaluate `node` at the current tick.
    pub fn trigger_update(&self, node: NodeId) {
        self.queue_update(node, 0);
    }

    /// Queue an edit. It is applied before the next event is processed.
    pub fn submit(&self, command: Command) {
        self.shared.submit(command);
    }

    /// Queue a node for insertion and return its id.
    pub fn add_node(&self, node: Node) -> NodeId {
        let id = node.id();
        self.submit(Command::AddNode(node));
        id
    }

    pub fn remove_node(&self, node: NodeId) {
        self.submit(Command::RemoveNode(node));
    }

    pub fn connect(&self, a: PinRef, b: PinRef) {
        self.submit(Command::Connect(a, b));
    }

    pub fn disconnect(&self, a: PinRef, b: PinRef) {
        self.submit(Command::Disconnect(a, b));
    }

    pub fn toggle(&self, switch: NodeId) {
        self.submit(Command::Toggle(switch));
    }

    pub fn set_switch(&self, switch: NodeId, high: bool) {
        self.submit(Command::SetSwitch(switch, high));
    }

    /// Re-drive every wire and re-evaluate every node.
    pub fn resync(&self) {
        self.submit(Command::Resync);
    }

    /// Run `f` against the circuit while holding its lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&Circuit) -> R) -> R {
        f(&self.shared.circuit.lock())
    }

    /// Current logical time in ticks.
    pub fn simulation_time(&self) -> u64 {
        self.shared.inbox.lock().events.time()
    }

    pub fn pending_events(&self) -> usize {
        self.shared.inbox.lock().events.len()
    }

    pub fn pending_commands(&self) -> usize {
        self.shared.inbox.lock().commands.len()
    }
}

/// The discrete-event simulation engine.
///
/// The engine owns its circuit. While the background loop runs, the circuit
/// is only changed through [`Command`]s, which the loop applies between
/// events. When the loop is stopped, [`step`](Self::step) and
/// [`run_until_idle`](Self::run_until_idle) process the same work on the
/// calling thread.
#[derive(Debug)]
pub struct SimulationEngine {
    handle: EngineHandle,
    config: EngineConfig,
    worker: Option<JoinHandle<()>>,
}

impl SimulationEngine {
    /// Create an engine for `circuit` with default configuration.
    pub fn new(circuit: Circuit) -> Self {
        Self::with_config(circuit, EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(circuit: Circuit, config: EngineConfig) -> Self {
        let shared = Shared {
            circuit: Mutex::new(circuit),
            inbox: Mutex::new(Inbox::default()),
            wake: Condvar::new(),
            running: AtomicBool::new(false),
            gate_delay: config.gate_delay,
        };
        Self {
            handle: EngineHandle {
                shared: Arc::new(shared),
            },
            config,
            worker: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A handle that can be moved to other threads.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Start the background loop. Does nothing if it is already running.
    pub fn start(&mut self) -> Result<()> {
        let shared = &self.handle.shared;
        if shared.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let worker_shared = Arc::clone(shared);
        let idle_wait = self.config.idle_wait;
        let spawned = thread::Builder::new()
            .name("gatesim-engine".to_string())
            .spawn(move || worker_shared.run(idle_wait));

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                shared.running.store(false, Ordering::Release);
                Err(GatesimError::EngineThread {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Stop the background loop and wait for it to finish.
    ///
    /// An event the loop has already taken is processed to completion.
    pub fn stop(&mut self) -> Result<()> {
        let shared = &self.handle.shared;
        shared.running.store(false, Ordering::Release);
        {
            let _inbox = shared.inbox.lock();
            shared.wake.notify_all();
        }

        if let Some(worker) = self.worker.take() {
            worker.join().map_err(|_| GatesimError::EngineThread {
                message: "simulation thread panicked".to_string(),
            })?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.shared.running.load(Ordering::Acquire)
    }

    /// Process one command or event on the calling thread.
    ///
    /// Returns `false` when there was nothing to do.
    pub fn step(&mut self) -> Result<bool> {
        self.ensure_stopped()?;
        Ok(match self.handle.shared.next_work() {
            Some(work) => {
                self.handle.shared.process(work);
                true
            }
            None => false,
        })
    }

    /// Drain commands and events on the calling thread until nothing is left
    /// or `max_events` events have been processed.
    ///
    /// Returns the number of events processed. An oscillating circuit never
    /// runs dry, so the cap is what ends the run.
    pub fn run_until_idle(&mut self, max_events: usize) -> Result<usize> {
        self.ensure_stopped()?;
        let shared = &self.handle.shared;
        let mut events = 0;
        while events < max_events {
            match shared.next_work() {
                Some(work) => {
                    if shared.process(work) {
                        events += 1;
                    }
                }
                None => return Ok(events),
            }
        }
        debug!(
            max_events,
            pending = self.handle.pending_events(),
            "event cap reached before the circuit settled"
        );
        Ok(events)
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.is_running() {
            Err(GatesimError::EngineRunning)
        } else {
            Ok(())
        }
    }

    pub fn queue_update(&self, node: NodeId, delay: u64) {
        self.handle.queue_update(node, delay);
    }

    pub fn trigger_update(&self, node: NodeId) {
        self.handle.trigger_update(node);
    }

    pub fn submit(&self, command: Command) {
        self.handle.submit(command);
    }

    pub fn add_node(&self, node: Node) -> NodeId {
        self.handle.add_node(node)
    }

    pub fn remove_node(&self, node: NodeId) {
        self.handle.remove_node(node);
    }

    pub fn connect(&self, a: PinRef, b: PinRef) {
        self.handle.connect(a, b);
    }

    pub fn disconnect(&self, a: PinRef, b: PinRef) {
        self.handle.disconnect(a, b);
    }

    pub fn toggle(&self, switch: NodeId) {
        self.handle.toggle(switch);
    }

    pub fn set_switch(&self, switch: NodeId, high: bool) {
        self.handle.set_switch(switch, high);
    }

    pub fn resync(&self) {
        self.handle.resync();
    }

    pub fn inspect<R>(&self, f: impl FnOnce(&Circuit) -> R) -> R {
        self.handle.inspect(f)
    }

    pub fn simulation_time(&self) -> u64 {
        self.handle.simulation_time()
    }

    pub fn pending_events(&self) -> usize {
        self.handle.pending_events()
    }
}

impl Drop for SimulationEngine {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "simulation loop did not shut down cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::LogicValue;
    use crate::components::{Gate, InputSwitch, OutputBulb};
    use std::time::Instant;

    struct Fixture {
        engine: SimulationEngine,
        sw1: NodeId,
        and: NodeId,
        bulb: NodeId,
    }

    /// sw1 (LOW) and sw2 (HIGH) into an AND gate driving a bulb.
    fn and_into_bulb() -> Fixture {
        let mut c = Circuit::new();
        let sw1 = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::new())).named("sw1"));
        let sw2 = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::with_state(true))).named("sw2"));
        let and = c.add_node(Node::new(Gate::And));
        let bulb = c.add_node(Node::new(Gate::OutputBulb(OutputBulb::new())).named("lamp"));
        c.connect(PinRef::output(sw1, 0), PinRef::input(and, 0)).unwrap();
        c.connect(PinRef::output(sw2, 0), PinRef::input(and, 1)).unwrap();
        c.connect(PinRef::output(and, 0), PinRef::input(bulb, 0)).unwrap();
        Fixture {
            engine: SimulationEngine::new(c),
            sw1,
            and,
            bulb,
        }
    }

    fn bulb_active(engine: &SimulationEngine, bulb: NodeId) -> bool {
        engine.inspect(|c| match c.node(bulb).map(Node::gate) {
            Some(Gate::OutputBulb(b)) => b.is_active(),
            _ => false,
        })
    }

    #[test]
    fn test_toggle_reaches_bulb_in_two_ticks() {
        let Fixture {
            mut engine,
            sw1,
            bulb,
            ..
        } = and_into_bulb();
        engine.resync();
        engine.run_until_idle(1_000).unwrap();
        assert!(!bulb_active(&engine, bulb));

        let start = engine.simulation_time();
        engine.toggle(sw1);
        engine.run_until_idle(1_000).unwrap();

        assert!(bulb_active(&engine, bulb));
        assert_eq!(engine.simulation_time() - start, 2);
        assert_eq!(engine.pending_events(), 0);
    }

    #[test]
    fn test_gate_delay_is_configurable() {
        let mut c = Circuit::new();
        let s = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::new())));
        let not = c.add_node(Node::new(Gate::Not));
        c.connect(PinRef::output(s, 0), PinRef::input(not, 0)).unwrap();
        let config = EngineConfig::new().with_gate_delay(5);
        let mut engine = SimulationEngine::with_config(c, config);
        engine.resync();
        engine.run_until_idle(100).unwrap();

        let start = engine.simulation_time();
        engine.toggle(s);
        engine.run_until_idle(100).unwrap();
        assert_eq!(engine.simulation_time() - start, 5);
        assert_eq!(
            engine.inspect(|c| c.pin(PinRef::output(not, 0)).unwrap().value()),
            LogicValue::Low
        );
    }

    #[test]
    fn test_step_processes_commands_before_events() {
        let Fixture {
            mut engine,
            sw1,
            and,
            ..
        } = and_into_bulb();
        engine.queue_update(and, 3);
        engine.toggle(sw1);
        assert_eq!(engine.pending_events(), 1);

        // the toggle is applied first and schedules sw1 at tick 0
        assert!(engine.step().unwrap());
        assert_eq!(engine.pending_events(), 2);
        assert!(engine.step().unwrap());
        assert_eq!(engine.simulation_time(), 0);
    }

    #[test]
    fn test_run_until_idle_respects_cap() {
        // NOT gate feeding itself oscillates forever
        let mut c = Circuit::new();
        let not = c.add_node(Node::new(Gate::Not));
        c.connect(PinRef::output(not, 0), PinRef::input(not, 0)).unwrap();
        let mut engine = SimulationEngine::new(c);
        engine.trigger_update(not);

        assert_eq!(engine.run_until_idle(50).unwrap(), 50);
        assert!(engine.pending_events() > 0);
    }

    #[test]
    fn test_event_for_missing_node_does_not_halt() {
        let Fixture {
            mut engine,
            sw1,
            bulb,
            ..
        } = and_into_bulb();
        engine.trigger_update(NodeId::new());
        engine.set_switch(sw1, true);
        engine.resync();
        engine.run_until_idle(1_000).unwrap();
        assert!(bulb_active(&engine, bulb));
    }

    #[test]
    fn test_evaluation_fault_does_not_halt() {
        let mut c = Circuit::new();
        // a decoder behind NOT's single input pin cannot evaluate
        let broken = c.add_node(Node::new(Gate::Not).named("broken"));
        *c.node_mut(broken).unwrap().gate_mut() = Gate::SevenSegmentDecoder;
        let sw = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::new())));
        let not = c.add_node(Node::new(Gate::Not));
        c.connect(PinRef::output(sw, 0), PinRef::input(not, 0)).unwrap();
        assert!(matches!(
            c.update(broken),
            Err(GatesimError::EvaluationFault { .. })
        ));

        let mut engine = SimulationEngine::new(c);
        engine.trigger_update(broken);
        engine.toggle(sw);
        engine.run_until_idle(100).unwrap();

        assert_eq!(
            engine.inspect(|c| c.pin(PinRef::output(not, 0)).unwrap().value()),
            LogicValue::Low
        );
        assert_eq!(engine.pending_events(), 0);
    }

    #[test]
    fn test_invalid_command_is_dropped() {
        let Fixture {
            mut engine, and, ..
        } = and_into_bulb();
        engine.connect(PinRef::output(and, 0), PinRef::input(and, 0));
        engine.run_until_idle(100).unwrap();
        assert_eq!(
            engine.inspect(|c| c.pin(PinRef::output(and, 0)).unwrap().connections().len()),
            1
        );
    }

    #[test]
    fn test_edits_through_commands() {
        let mut engine = SimulationEngine::new(Circuit::new());
        let sw = engine.add_node(Node::new(Gate::InputSwitch(InputSwitch::with_state(true))));
        let not = engine.add_node(Node::new(Gate::Not));
        engine.connect(PinRef::output(sw, 0), PinRef::input(not, 0));
        engine.run_until_idle(100).unwrap();
        assert_eq!(
            engine.inspect(|c| c.pin(PinRef::output(not, 0)).unwrap().value()),
            LogicValue::Low
        );

        engine.remove_node(sw);
        engine.run_until_idle(100).unwrap();
        // input floats, NOT(undefined) is HIGH
        assert_eq!(
            engine.inspect(|c| c.pin(PinRef::output(not, 0)).unwrap().value()),
            LogicValue::High
        );
        assert_eq!(engine.inspect(Circuit::len), 1);
    }

    #[test]
    fn test_background_loop() {
        let Fixture {
            mut engine,
            sw1,
            bulb,
            ..
        } = and_into_bulb();
        engine.start().unwrap();
        engine.start().unwrap();
        assert!(engine.is_running());
        assert!(matches!(engine.step(), Err(GatesimError::EngineRunning)));

        let handle = engine.handle();
        thread::spawn(move || {
            handle.resync();
            handle.toggle(sw1);
        })
        .join()
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !bulb_active(&engine, bulb) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(bulb_active(&engine, bulb));

        engine.stop().unwrap();
        assert!(!engine.is_running());
        // stopping twice is fine
        engine.stop().unwrap();
        assert!(engine.step().is_ok());
    }
}
