//! The packet worker: wires the wire codec, session, pipeline, HID encoding, pairing, and the
//! device state machine together into the one loop a board drives.

use crate::config::Board;
use crate::control::{ButtonEvent, ControlSurface};
use crate::crypto::{self, IV_LEN, TAG_LEN};
use crate::error::CoreError;
use crate::hid::{self, JigglePrng, KeyboardReport, MouseButtonState};
use crate::keystore::Keystore;
use crate::pairing::PairingOrchestrator;
use crate::pipeline::{CommandPipeline, StringPipeline};
use crate::session::SecureSession;
use crate::state::{DeviceState, StateMachine};
use crate::time::Instant;
use crate::wire::codec::ByteWriter;
use crate::wire::{Command, Frame, PacketType, ResponsePacket, ResponseType, MAX_CONSUMER_CODES};
use crate::{MAX_DATA_LEN, MAX_QUEUE_STRING_LEN, SLOW_MODE_MILLIS};

const JIGGLE_PERIOD_MILLIS: u32 = 1_000;

/// Delay, in milliseconds, between pressing and releasing each code in a `consumer_control` batch.
const CONSUMER_RELEASE_DELAY_MILLIS: u32 = 10;

/// Tracks the in-progress keyboard-typing job, paced at [`SLOW_MODE_MILLIS`] per character.
struct Typist {
    current: Option<heapless::String<MAX_QUEUE_STRING_LEN>>,
    index: usize,
    last_sent: Instant,
}

impl Typist {
    fn new(now: Instant) -> Self {
        Typist {
            current: None,
            index: 0,
            last_sent: now,
        }
    }
}

/// Paces a `consumer_control` batch: one code pressed, held for
/// [`CONSUMER_RELEASE_DELAY_MILLIS`], then released before the next code starts.
struct ConsumerSequencer {
    codes: heapless::Vec<u16, MAX_CONSUMER_CODES>,
    index: usize,
    pressed_at: Option<Instant>,
}

impl ConsumerSequencer {
    fn new() -> Self {
        ConsumerSequencer {
            codes: heapless::Vec::new(),
            index: 0,
            pressed_at: None,
        }
    }

    /// Replaces any in-progress batch with a new one, starting from the first code.
    fn enqueue(&mut self, codes: heapless::Vec<u16, MAX_CONSUMER_CODES>) {
        self.codes = codes;
        self.index = 0;
        self.pressed_at = None;
    }
}

/// Ties every subsystem together for one connection. A board owns one of these per active
/// connection and drives it from attribute writes, button events, and a periodic tick.
pub struct PacketWorker<B: Board> {
    keystore: Keystore<B::Store>,
    session: SecureSession,
    pairing: PairingOrchestrator,
    state: StateMachine<B::StateObserver>,
    commands: CommandPipeline,
    strings: StringPipeline,
    typist: Typist,
    consumer: ConsumerSequencer,
    mouse_buttons: MouseButtonState,
    jiggle: Option<JigglePrng>,
    jiggle_enabled: bool,
    last_jiggle: Instant,
    hid: B::Hid,
    notifier: B::Notifier,
    rng: B::Rng,
}

impl<B: Board> PacketWorker<B> {
    /// Builds a worker over the given backends, with the device state machine starting fresh at
    /// `now`.
    pub fn new(
        store: B::Store,
        rng: B::Rng,
        hid: B::Hid,
        notifier: B::Notifier,
        state_observer: B::StateObserver,
        now: Instant,
    ) -> Self {
        PacketWorker {
            keystore: Keystore::new(store),
            session: SecureSession::new(),
            pairing: PairingOrchestrator::new(),
            state: StateMachine::new(state_observer, now),
            commands: CommandPipeline::new(),
            strings: StringPipeline::new(),
            typist: Typist::new(now),
            consumer: ConsumerSequencer::new(),
            mouse_buttons: MouseButtonState::default(),
            jiggle: None,
            jiggle_enabled: false,
            last_jiggle: now,
            hid,
            notifier,
            rng,
        }
    }

    /// The device's current state.
    pub fn state(&self) -> DeviceState {
        self.state.current()
    }

    /// Handles one raw attribute write from the peer.
    pub fn handle_attribute_write(&mut self, bytes: &[u8], now: Instant) -> Result<(), CoreError> {
        let frame = Frame::decode(bytes)?;
        match frame.packet_type {
            PacketType::Auth => self.handle_auth(frame.body, now),
            PacketType::Data => self.handle_data(frame.iv, frame.tag, frame.body, now),
        }
    }

    fn handle_auth(&mut self, peer_base64: &[u8], now: Instant) -> Result<(), CoreError> {
        if self.pairing.is_active() {
            let result = self
                .session
                .agree_and_enroll(&mut self.keystore, &mut self.rng, peer_base64);
            self.pairing.finish();
            match result {
                Ok(()) => {
                    self.state.transition(DeviceState::Ready, now);
                    self.send_response(ResponsePacket::challenge(*self.session.session_salt()));
                    Ok(())
                }
                Err(e) => {
                    self.state.transition(DeviceState::Error, now);
                    self.send_response(ResponsePacket::from(e));
                    Err(e)
                }
            }
        } else if self.session.load_enrolled(&self.keystore, peer_base64)? {
            self.session.derive_session_key(&mut self.rng)?;
            self.state.transition(DeviceState::Ready, now);
            self.send_response(ResponsePacket::challenge(*self.session.session_salt()));
            Ok(())
        } else {
            self.state.transition(DeviceState::Unpaired, now);
            self.send_response(ResponsePacket::bare(ResponseType::PeerUnknown));
            Err(CoreError::PeerUnknown)
        }
    }

    fn handle_data(
        &mut self,
        iv: [u8; IV_LEN],
        tag: [u8; TAG_LEN],
        ciphertext: &[u8],
        now: Instant,
    ) -> Result<(), CoreError> {
        // Receiving DATA with no active session is an admission-control rejection, not a crypto
        // failure: no state change, no notification, matching §4.4's admission-check ordering.
        if !self.session.is_ready() {
            return Err(CoreError::NoSession);
        }
        if ciphertext.len() > MAX_DATA_LEN {
            self.state.transition(DeviceState::Drop, now);
            self.send_response(ResponsePacket::bare(ResponseType::Drop));
            return Err(CoreError::Decode);
        }
        let mut buf = [0u8; MAX_DATA_LEN];
        let len = ciphertext.len();
        buf[..len].copy_from_slice(ciphertext);

        if let Err(e) = self.session.open(&iv, &tag, &mut buf[..len]) {
            self.state.transition(DeviceState::Drop, now);
            self.send_response(ResponsePacket::bare(ResponseType::Drop));
            return Err(e);
        }

        let command = match Command::decode(&buf[..len]) {
            Ok(c) => c,
            Err(_) => {
                self.state.transition(DeviceState::Drop, now);
                self.send_response(ResponsePacket::bare(ResponseType::Drop));
                return Err(CoreError::Decode);
            }
        };

        match self.commands.push(command) {
            Ok(()) => Ok(()),
            Err(e) => {
                // Queue-full packets are discarded silently on the wire (§7): no notification,
                // just the state transition.
                self.state.transition(DeviceState::Drop, now);
                Err(e)
            }
        }
    }

    /// Dispatches one queued command, if any. Returns `true` if a command was processed.
    pub fn process_one_command(&mut self) -> Result<bool, CoreError> {
        let Some(command) = self.commands.pop() else {
            return Ok(false);
        };
        match command {
            Command::Keyboard(text) => {
                self.strings.push(text.as_str())?;
            }
            Command::Keycode(encoded) => {
                self.hid.keyboard(hid::encode_keycode_report(&encoded));
                self.hid.keyboard(KeyboardReport::RELEASED);
            }
            Command::Mouse {
                frames,
                l_click,
                r_click,
                wheel,
            } => {
                let buttons = self.mouse_buttons.apply(l_click, r_click);
                for (i, (dx, dy)) in frames.iter().enumerate() {
                    let wheel_delta = if i == 0 { wheel } else { 0 };
                    self.hid
                        .mouse(hid::mouse_frame_report(*dx, *dy, wheel_delta, buttons));
                }
            }
            Command::ConsumerControl(codes) => {
                self.consumer.enqueue(codes);
            }
            Command::SystemControl(usage) => {
                self.hid.system_control(hid::system_control_report(usage));
            }
            Command::MouseJiggle(enabled) => {
                self.jiggle_enabled = enabled;
                if enabled {
                    let mut seed_bytes = [0u8; 4];
                    crypto::random(&mut self.rng, &mut seed_bytes);
                    self.jiggle = Some(JigglePrng::seed(u32::from_le_bytes(seed_bytes)));
                } else {
                    self.jiggle = None;
                }
            }
            Command::Rename(name) => {
                ControlSurface::handle_rename(&mut self.keystore, name.as_str())?;
            }
        }
        Ok(true)
    }

    /// Sends the next character of the in-progress typing job, if the pacing interval has passed.
    pub fn tick_typing(&mut self, now: Instant) {
        if self.typist.current.is_none() {
            self.typist.current = self.strings.pop();
            self.typist.index = 0;
        }
        let Some(current) = self.typist.current.clone() else {
            return;
        };
        if now.duration_since(self.typist.last_sent).as_millis() < SLOW_MODE_MILLIS {
            return;
        }
        let bytes = current.as_bytes();
        if self.typist.index >= bytes.len() {
            self.typist.current = None;
            return;
        }
        if let Some(report) = hid::keyboard_press(bytes[self.typist.index]) {
            self.hid.keyboard(report);
            self.hid.keyboard(KeyboardReport::RELEASED);
        }
        self.typist.index += 1;
        self.typist.last_sent = now;
    }

    /// Advances an in-progress `consumer_control` batch: presses the next code, or releases the
    /// current one once [`CONSUMER_RELEASE_DELAY_MILLIS`] has elapsed since it was pressed.
    pub fn tick_consumer(&mut self, now: Instant) {
        if let Some(since) = self.consumer.pressed_at {
            if now.duration_since(since).as_millis() < CONSUMER_RELEASE_DELAY_MILLIS {
                return;
            }
            let code = self.consumer.codes[self.consumer.index];
            self.hid.consumer(hid::consumer_report(code, false));
            self.consumer.index += 1;
            self.consumer.pressed_at = None;
            return;
        }
        if let Some(&code) = self.consumer.codes.get(self.consumer.index) {
            self.hid.consumer(hid::consumer_report(code, true));
            self.consumer.pressed_at = Some(now);
        }
    }

    /// Moves the mouse by a small pseudo-random amount if jiggle is enabled and the period has
    /// elapsed.
    pub fn tick_jiggle(&mut self, now: Instant) {
        if !self.jiggle_enabled {
            return;
        }
        if now.duration_since(self.last_jiggle).as_millis() < JIGGLE_PERIOD_MILLIS {
            return;
        }
        if let Some(prng) = self.jiggle.as_mut() {
            let (dx, dy) = prng.next_delta();
            let buttons = self.mouse_buttons.apply(
                crate::wire::ClickAction::NoOp,
                crate::wire::ClickAction::NoOp,
            );
            self.hid
                .mouse(hid::mouse_frame_report(dx as i32, dy as i32, 0, buttons));
        }
        self.last_jiggle = now;
    }

    /// Advances auto-recovery and the pairing-typing delay. Call this on every tick.
    pub fn tick_state(&mut self, now: Instant) -> Result<(), CoreError> {
        self.state.poll(now);
        self.pairing.poll(&mut self.strings, now)?;
        Ok(())
    }

    /// Routes a physical button event.
    pub fn on_button(&mut self, event: ButtonEvent, now: Instant) {
        ControlSurface::handle_button(event, &mut self.pairing, &mut self.session, &mut self.rng, now);
        if event == ButtonEvent::Hold {
            self.state.transition(DeviceState::Pairing, now);
        }
    }

    /// Tears the session down on disconnect.
    pub fn on_disconnect(&mut self, now: Instant) {
        self.session.teardown();
        self.pairing.cancel(&mut self.session);
        self.state.transition(DeviceState::Disconnected, now);
    }

    fn send_response(&mut self, response: ResponsePacket) {
        let mut out = [0u8; 2 + 32];
        let mut writer = ByteWriter::new(&mut out);
        if response.encode(&mut writer).is_ok() {
            let used = out.len() - writer.space_left();
            self.notifier.notify(&out[..used]);
        }
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;
    use crate::config::{HidSink, Notifier};
    use crate::keystore::mock::InMemoryStore;
    use crate::state::StateObserver;
    use crate::wire::codec::ByteWriter as Writer;
    use crate::wire::ClickAction;
    use base64ct::{Base64, Encoding};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use std::vec::Vec;

    struct TestBoard;

    impl Board for TestBoard {
        type Store = InMemoryStore;
        type Clock = crate::time::Instant;
        type Rng = ChaCha20Rng;
        type Hid = RecordingHid;
        type Notifier = RecordingNotifier;
        type StateObserver = RecordingObserver;
    }

    impl crate::time::Clock for crate::time::Instant {
        fn now(&self) -> crate::time::Instant {
            *self
        }
    }

    #[derive(Default)]
    struct RecordingHid {
        keyboard: Vec<KeyboardReport>,
        mouse: Vec<crate::hid::MouseReport>,
        consumer: Vec<crate::hid::ConsumerReport>,
    }

    impl HidSink for RecordingHid {
        fn keyboard(&mut self, report: KeyboardReport) {
            self.keyboard.push(report);
        }
        fn mouse(&mut self, report: crate::hid::MouseReport) {
            self.mouse.push(report);
        }
        fn consumer(&mut self, report: crate::hid::ConsumerReport) {
            self.consumer.push(report);
        }
        fn system_control(&mut self, _report: crate::hid::SystemControlReport) {}
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Vec<Vec<u8>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, bytes: &[u8]) {
            self.sent.push(bytes.to_vec());
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        states: Vec<DeviceState>,
    }

    impl StateObserver for RecordingObserver {
        fn on_state_changed(&mut self, state: DeviceState) {
            self.states.push(state);
        }
    }

    fn new_worker(now: Instant) -> PacketWorker<TestBoard> {
        PacketWorker::new(
            InMemoryStore::default(),
            ChaCha20Rng::seed_from_u64(99),
            RecordingHid::default(),
            RecordingNotifier::default(),
            RecordingObserver::default(),
            now,
        )
    }

    fn auth_frame(peer_base64: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 32 + peer_base64.len()];
        let mut writer = Writer::new(&mut out);
        Frame::encode(
            &[0u8; IV_LEN],
            &[0u8; TAG_LEN],
            PacketType::Auth,
            false,
            peer_base64,
            &mut writer,
        )
        .unwrap();
        out
    }

    fn pair(worker: &mut PacketWorker<TestBoard>, seed: u64, now: Instant) {
        worker.on_button(ButtonEvent::Hold, now);
        let mut peer_rng = ChaCha20Rng::seed_from_u64(seed);
        let (_, peer_public) = crypto::PrivateKey::generate(&mut peer_rng);
        let mut buf = [0u8; 88];
        let encoded = Base64::encode(peer_public.uncompressed(), &mut buf).unwrap();
        worker
            .handle_attribute_write(&auth_frame(encoded.as_bytes()), now)
            .unwrap();
    }

    fn send_command(worker: &mut PacketWorker<TestBoard>, command: &Command, now: Instant) {
        let mut plaintext = [0u8; MAX_DATA_LEN];
        let mut writer = Writer::new(&mut plaintext);
        command.encode(&mut writer).unwrap();
        let used = MAX_DATA_LEN - writer.space_left();
        let mut ciphertext = plaintext;
        let (iv, tag) = worker.session.seal(&mut worker.rng, &mut ciphertext[..used]).unwrap();

        let mut frame_buf = vec![0u8; 32 + used];
        let mut frame_writer = Writer::new(&mut frame_buf);
        Frame::encode(&iv, &tag, PacketType::Data, false, &ciphertext[..used], &mut frame_writer).unwrap();

        worker.handle_attribute_write(&frame_buf, now).unwrap();
    }

    #[test]
    fn full_pairing_flow_reaches_ready() {
        let mut worker = new_worker(Instant::from_millis(0));
        pair(&mut worker, 1, Instant::from_millis(100));
        assert_eq!(worker.state(), DeviceState::Ready);
    }

    #[test]
    fn data_packet_before_pairing_is_rejected() {
        let mut worker = new_worker(Instant::from_millis(0));
        let mut out = vec![0u8; 32];
        let mut writer = Writer::new(&mut out);
        Frame::encode(&[0u8; IV_LEN], &[0u8; TAG_LEN], PacketType::Data, false, &[], &mut writer).unwrap();

        let result = worker.handle_attribute_write(&out, Instant::from_millis(0));
        assert_eq!(result, Err(CoreError::NoSession));
    }

    #[test]
    fn keyboard_command_round_trips_to_hid_reports() {
        let mut worker = new_worker(Instant::from_millis(0));
        pair(&mut worker, 2, Instant::from_millis(100));

        let mut text = heapless::String::<MAX_DATA_LEN>::new();
        text.push_str("hi").unwrap();
        send_command(&mut worker, &Command::Keyboard(text), Instant::from_millis(200));
        assert!(worker.process_one_command().unwrap());

        worker.tick_typing(Instant::from_millis(200));
        worker.tick_typing(Instant::from_millis(200 + SLOW_MODE_MILLIS));
        assert!(!worker.hid.keyboard.is_empty());
    }

    #[test]
    fn keycode_command_sends_combined_report_then_release() {
        let mut worker = new_worker(Instant::from_millis(0));
        pair(&mut worker, 4, Instant::from_millis(100));

        let mut encoded = [0u8; 6];
        encoded[0] = 0x82; // left-alt modifier
        encoded[1] = 0x04; // 'a'
        send_command(&mut worker, &Command::Keycode(encoded), Instant::from_millis(200));
        assert!(worker.process_one_command().unwrap());

        assert_eq!(worker.hid.keyboard.len(), 2);
        assert_eq!(worker.hid.keyboard[0].modifiers, 0x04);
        assert_eq!(worker.hid.keyboard[0].keycodes[0], 0x04);
        assert_eq!(worker.hid.keyboard[1], KeyboardReport::RELEASED);
    }

    #[test]
    fn mouse_command_emits_one_report_per_frame_with_buttons_held() {
        let mut worker = new_worker(Instant::from_millis(0));
        pair(&mut worker, 5, Instant::from_millis(100));

        let mut frames = heapless::Vec::new();
        frames.push((5, -2)).unwrap();
        frames.push((3, 1)).unwrap();
        let command = Command::Mouse {
            frames,
            l_click: ClickAction::Press,
            r_click: ClickAction::NoOp,
            wheel: -1,
        };
        send_command(&mut worker, &command, Instant::from_millis(200));
        assert!(worker.process_one_command().unwrap());

        assert_eq!(worker.hid.mouse.len(), 2);
        assert!(worker.hid.mouse.iter().all(|r| r.buttons == crate::hid::MouseReport::BUTTON_LEFT));
        assert_eq!(worker.hid.mouse[0].wheel, -1);
        assert_eq!(worker.hid.mouse[1].wheel, 0);
    }

    #[test]
    fn consumer_control_batch_presses_then_releases_with_delay() {
        let mut worker = new_worker(Instant::from_millis(0));
        pair(&mut worker, 6, Instant::from_millis(100));

        let mut codes = heapless::Vec::new();
        codes.push(0x00e9).unwrap();
        codes.push(0x00ea).unwrap();
        send_command(
            &mut worker,
            &Command::ConsumerControl(codes),
            Instant::from_millis(200),
        );
        assert!(worker.process_one_command().unwrap());

        worker.tick_consumer(Instant::from_millis(200));
        assert_eq!(worker.hid.consumer.last().unwrap().usage, 0x00e9);

        worker.tick_consumer(Instant::from_millis(205));
        assert_eq!(worker.hid.consumer.last().unwrap().usage, 0x00e9);

        worker.tick_consumer(Instant::from_millis(210));
        assert_eq!(worker.hid.consumer.last().unwrap().usage, 0);

        worker.tick_consumer(Instant::from_millis(210));
        assert_eq!(worker.hid.consumer.last().unwrap().usage, 0x00ea);
    }

    #[test]
    fn disconnect_tears_down_session() {
        let mut worker = new_worker(Instant::from_millis(0));
        pair(&mut worker, 3, Instant::from_millis(100));
        assert!(worker.session.is_ready());

        worker.on_disconnect(Instant::from_millis(200));
        assert!(!worker.session.is_ready());
        assert_eq!(worker.state(), DeviceState::Disconnected);
    }
}
