use std::cell::RefCell;
use std::rc::Rc;

use egwchat_core::voice::{AUDIO_MIME, MIC_DENIED_MESSAGE};
use egwchat_core::{append_transcript, VoiceCapability};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobEvent, BlobPropertyBag, Document, HtmlButtonElement, HtmlTextAreaElement,
    MediaRecorder, MediaRecorderOptions, MediaStream, MediaStreamConstraints, MediaStreamTrack,
};

use crate::api::Backend;
use crate::dom;
use crate::storage::stored_token;

#[derive(Default)]
enum Capture {
    #[default]
    Idle,
    /// Waiting for microphone permission
    Starting,
    Recording(MediaRecorder),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Start,
    Stop,
    Wait,
}

impl Capture {
    /// What a click on the microphone button does in this state
    fn on_click(&self) -> Toggle {
        match self {
            Capture::Idle => Toggle::Start,
            Capture::Starting => Toggle::Wait,
            Capture::Recording(_) => Toggle::Stop,
        }
    }
}

/// Recorder callbacks of the latest capture, released when the next one starts
struct Handlers {
    _on_data: Closure<dyn FnMut(BlobEvent)>,
    _on_stop: Closure<dyn FnMut()>,
}

#[derive(Default)]
struct Recording {
    capture: Capture,
    chunks: Vec<Blob>,
    handlers: Option<Handlers>,
}

/// Microphone button that records a clip and appends its transcript to the chat input
#[derive(Clone)]
pub struct VoiceInput {
    button: Option<HtmlButtonElement>,
    backend: Backend,
    input: HtmlTextAreaElement,
    recording: Rc<RefCell<Recording>>,
}

impl VoiceInput {
    pub fn new(
        document: &Document,
        backend: Backend,
        input: HtmlTextAreaElement,
    ) -> Result<Self, JsValue> {
        let button = document
            .get_element_by_id("voice-btn")
            .and_then(|element| element.dyn_into::<HtmlButtonElement>().ok());

        Ok(Self {
            button,
            backend,
            input,
            recording: Rc::new(RefCell::new(Recording::default())),
        })
    }

    pub fn attach(self, token: Option<&str>) -> Result<(), JsValue> {
        let Some(button) = self.button.clone() else {
            return Ok(());
        };

        if let VoiceCapability::Unavailable(reason) = VoiceCapability::for_token(token) {
            button.set_disabled(true);
            button.set_title(reason);
            return Ok(());
        }

        // Browsers without getUserMedia keep an inert button
        if crate::window()?.navigator().media_devices().is_err() {
            log::info!("Media devices unavailable, voice input disabled");
            return Ok(());
        }

        dom::add_click_listener(&button, move || {
            let voice = self.clone();
            wasm_bindgen_futures::spawn_local(async move { voice.toggle().await });
        })
    }

    async fn toggle(self) {
        let action = self.recording.borrow().capture.on_click();
        match action {
            Toggle::Wait => log::debug!("Microphone request still pending"),
            Toggle::Stop => {
                let capture = std::mem::take(&mut self.recording.borrow_mut().capture);
                if let Capture::Recording(recorder) = capture {
                    if let Err(e) = recorder.stop() {
                        log::warn!("Failed to stop recording: {:?}", e);
                    }
                }
                self.set_recording_class(false);
            }
            Toggle::Start => {
                // Set before the permission prompt so a second click cannot start another recorder
                self.recording.borrow_mut().capture = Capture::Starting;
                let started = self.start().await;
                let mut recording = self.recording.borrow_mut();
                match started {
                    Ok(recorder) => {
                        recording.capture = Capture::Recording(recorder);
                        drop(recording);
                        self.set_recording_class(true);
                    }
                    Err(e) => {
                        recording.capture = Capture::Idle;
                        drop(recording);
                        log::warn!("Microphone unavailable: {:?}", e);
                        dom::alert(MIC_DENIED_MESSAGE);
                    }
                }
            }
        }
    }

    async fn start(&self) -> Result<MediaRecorder, JsValue> {
        let devices = crate::window()?.navigator().media_devices()?;
        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        let stream: MediaStream = JsFuture::from(devices.get_user_media_with_constraints(&constraints)?)
            .await?
            .dyn_into()?;

        self.record(stream.clone()).inspect_err(|_| stop_tracks(&stream))
    }

    fn record(&self, stream: MediaStream) -> Result<MediaRecorder, JsValue> {
        let options = MediaRecorderOptions::new();
        options.set_mime_type(AUDIO_MIME);
        let recorder =
            MediaRecorder::new_with_media_stream_and_media_recorder_options(&stream, &options)?;

        self.recording.borrow_mut().chunks.clear();

        let recording = self.recording.clone();
        let on_data = Closure::wrap(Box::new(move |event: BlobEvent| {
            if let Some(data) = event.data().filter(|blob| blob.size() > 0.0) {
                recording.borrow_mut().chunks.push(data);
            }
        }) as Box<dyn FnMut(BlobEvent)>);
        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));

        let voice = self.clone();
        let on_stop = Closure::wrap(Box::new(move || {
            // Releases the microphone
            stop_tracks(&stream);
            let voice = voice.clone();
            wasm_bindgen_futures::spawn_local(async move { voice.upload().await });
        }) as Box<dyn FnMut()>);
        recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));

        recorder.start()?;
        self.recording.borrow_mut().handlers = Some(Handlers {
            _on_data: on_data,
            _on_stop: on_stop,
        });
        Ok(recorder)
    }

    /// Send the finished clip for transcription. Empty recordings are dropped.
    async fn upload(self) {
        let chunks = std::mem::take(&mut self.recording.borrow_mut().chunks);
        if chunks.is_empty() {
            return;
        }

        let audio = match recorded_clip(&chunks) {
            Ok(audio) => audio,
            Err(e) => {
                log::error!("Failed to assemble recording: {:?}", e);
                return;
            }
        };

        self.set_button_disabled(true);
        let token = stored_token().unwrap_or_default();
        match self.backend.transcribe(&token, &audio).await {
            Ok(Some(text)) => {
                let value = append_transcript(&self.input.value(), &text);
                self.input.set_value(&value);
                dom::dispatch_input(&self.input);
            }
            Ok(None) => log::debug!("Transcription returned no text"),
            Err(e) => log::error!("Transcription failed: {}", e),
        }
        self.set_button_disabled(false);
    }

    fn set_recording_class(&self, recording: bool) {
        let Some(button) = &self.button else {
            return;
        };
        let classes = button.class_list();
        let _ = if recording {
            classes.add_1("recording")
        } else {
            classes.remove_1("recording")
        };
    }

    fn set_button_disabled(&self, disabled: bool) {
        if let Some(button) = &self.button {
            button.set_disabled(disabled);
        }
    }
}

fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

fn recorded_clip(chunks: &[Blob]) -> Result<Blob, JsValue> {
    let parts = js_sys::Array::new();
    for chunk in chunks {
        parts.push(chunk);
    }
    let options = BlobPropertyBag::new();
    options.set_type(AUDIO_MIME);
    Blob::new_with_blob_sequence_and_options(&parts, &options)
}
