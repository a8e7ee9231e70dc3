//! FFI bindings for the library.
//!
//! Host apps use these functions to drive a chat screen from their own UI
//! toolkit, and optionally to plug in a native text generator.

use std::ffi::{CStr, c_char, c_void};
use std::ops::Deref;
use std::ptr;
use std::sync::{Arc, LazyLock};

use chatllm_core::config::NATIVE_REVEAL_DELAY;
use chatllm_core::{
    Chat, ChatBuilder, ChatConfigBuilder, Content, ImageRef, Origin,
};
use chatllm_model::{ErrorKind, ReplyProvider, ReplyRequest};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use tokio::task::spawn_blocking;

use crate::ReplyMode;
use crate::providers::Error as ProviderError;

static TOKIO_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    RuntimeBuilder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .build()
        .unwrap()
});

/// Error codes returned by the C APIs.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// No error occurred.
    Ok = 0,
    /// Invalid parameters or strings.
    Invalid = 1,
}

/// A wrapper around `ChatBuilder`. Most methods of `ChatBuilder` consume
/// `self`, but when exposing it to C it's heap-allocated by a box, so we
/// cannot take `self` out of it. The wrapper lets us move the builder out,
/// make some changes, and then put it back.
struct ChatBuilderWrapper {
    builder: Option<ChatBuilder>,
    config: ChatConfigBuilder,
}

/// Callbacks for various events from the chat.
///
/// Note that callback functions and `user_info` are assumed to be thread-safe
/// and able to send across the thread boundaries.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ChatCallbacks {
    /// User-defined data to be passed to the callbacks.
    pub user_info: *mut c_void,
    /// Callback to handle an appended or rewritten entry.
    ///
    /// Parameters:
    /// - `user_info`: The user-defined data.
    /// - `index`: Position of the entry in the transcript.
    /// - `origin`: Entry origin (0 for user, 1 for assistant).
    /// - `text`: Text of the entry, or null if it has none.
    /// - `text_len`: Length of the text.
    /// - `image`: Image URI of the entry, or null if it has none.
    /// - `image_len`: Length of the image URI.
    ///
    /// Strings are not nul-terminated and are only valid during the call.
    pub on_entry_changed: Option<
        unsafe extern "C" fn(
            *mut c_void,
            usize,
            u32,
            *const c_char,
            usize,
            *const c_char,
            usize,
        ),
    >,
    /// Callback to show or hide the typing indicator.
    pub on_typing_changed: Option<unsafe extern "C" fn(*mut c_void, bool)>,
    /// Callback to handle the chat becoming idle.
    pub on_idle: Option<unsafe extern "C" fn(*mut c_void)>,
    /// Callback to free the user-defined data.
    pub free: Option<unsafe extern "C" fn(*mut c_void)>,
}

// SAFETY: `ChatCallbacks` is guaranteed to be thread-safe by users.
unsafe impl Send for ChatCallbacks {}
unsafe impl Sync for ChatCallbacks {}

/// A native text generator supplied by the host.
///
/// `generate` is called on a blocking thread with the latest user text. It
/// must write the reply through `chatllm_reply_sink_write` and return
/// `true`, or return `false` on failure, in which case the fallback reply is
/// revealed instead.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct NativeGenerator {
    /// User-defined data to be passed to the callbacks.
    pub user_info: *mut c_void,
    /// Callback to generate a reply.
    ///
    /// Parameters:
    /// - `user_info`: The user-defined data.
    /// - `input`: The user text (not nul-terminated).
    /// - `input_len`: Length of the user text.
    /// - `sink`: The reply sink, only valid during the call.
    pub generate: Option<
        unsafe extern "C" fn(
            *mut c_void,
            *const c_char,
            usize,
            *mut c_void,
        ) -> bool,
    >,
    /// Callback to free the user-defined data.
    pub free: Option<unsafe extern "C" fn(*mut c_void)>,
}

// SAFETY: `NativeGenerator` is guaranteed to be thread-safe by users.
unsafe impl Send for NativeGenerator {}
unsafe impl Sync for NativeGenerator {}

/// Add reference-counting for the user info, so it can be safely freed when
/// it's no longer needed.
struct Shared<T: HasFree> {
    inner: T,
}

trait HasFree {
    fn free_fn(&self) -> Option<unsafe extern "C" fn(*mut c_void)>;
    fn user_info(&self) -> *mut c_void;
}

impl HasFree for ChatCallbacks {
    fn free_fn(&self) -> Option<unsafe extern "C" fn(*mut c_void)> {
        self.free
    }

    fn user_info(&self) -> *mut c_void {
        self.user_info
    }
}

impl HasFree for NativeGenerator {
    fn free_fn(&self) -> Option<unsafe extern "C" fn(*mut c_void)> {
        self.free
    }

    fn user_info(&self) -> *mut c_void {
        self.user_info
    }
}

impl<T: HasFree> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: HasFree> Drop for Shared<T> {
    fn drop(&mut self) {
        if let Some(free) = self.inner.free_fn() {
            // SAFETY: Assume the callback is valid.
            unsafe { free(self.inner.user_info()) };
        }
    }
}

/// Collects the reply written by a native generator.
#[derive(Default)]
struct ReplySink {
    reply: Option<String>,
}

/// A reply provider that calls into the host's native generator.
#[derive(Clone)]
struct NativeProvider {
    generator: Arc<Shared<NativeGenerator>>,
}

impl ReplyProvider for NativeProvider {
    type Error = ProviderError;

    fn generate(
        &self,
        req: &ReplyRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let generator = Arc::clone(&self.generator);
        let input = req.latest_user_text().unwrap_or_default().to_owned();
        async move {
            let Some(generate) = generator.generate else {
                return Err(ProviderError::new(
                    "no native generator",
                    ErrorKind::Unavailable,
                ));
            };
            let joined = spawn_blocking(move || {
                let mut sink = ReplySink::default();
                // SAFETY: Assume the callback is valid. `input` and `sink`
                // outlive the call.
                let ok = unsafe {
                    generate(
                        generator.user_info,
                        input.as_ptr() as *const _,
                        input.len(),
                        &mut sink as *mut ReplySink as *mut c_void,
                    )
                };
                (ok, sink.reply)
            })
            .await;

            match joined {
                Ok((true, Some(reply))) => Ok(reply),
                Ok((true, None)) => Err(ProviderError::new(
                    "native generator returned no reply",
                    ErrorKind::Other,
                )),
                Ok((false, _)) => Err(ProviderError::new(
                    "native generator failed",
                    ErrorKind::Rejected,
                )),
                Err(err) => Err(ProviderError::new(
                    format!("native generator panicked: {err}"),
                    ErrorKind::Other,
                )),
            }
        }
    }
}

fn new_builder_wrapper(
    builder: ChatBuilder,
    config: ChatConfigBuilder,
) -> *mut ChatBuilderWrapper {
    Box::into_raw(Box::new(ChatBuilderWrapper {
        builder: Some(builder),
        config,
    }))
}

/// Creates a chat builder with a built-in reply provider.
///
/// `mode` selects the provider: 0 for echo, 1 for mock, 2 for an unlinked
/// native generator (always uses the fallback reply). `out` will be set to
/// a pointer to the chat builder if the call succeeds.
///
/// The caller must either free the builder or use it to create a chat, or
/// the resources will be leaked.
///
/// # Safety
///
/// `out` must be a valid pointer that points to a pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_builder_new(
    out: *mut *mut c_void,
    mode: u32,
) -> ErrorCode {
    let mode = match mode {
        0 => ReplyMode::Echo,
        1 => ReplyMode::Mock,
        2 => ReplyMode::Unlinked,
        _ => return ErrorCode::Invalid,
    };
    let wrapper_ptr =
        new_builder_wrapper(mode.chat_builder(), ChatConfigBuilder::default());
    // SAFETY: Assume `out` is valid and properly aligned.
    unsafe {
        (out as *mut *mut ChatBuilderWrapper).write(wrapper_ptr);
    }

    ErrorCode::Ok
}

/// Creates a chat builder whose replies come from a native generator.
///
/// Replies are revealed faster than with the built-in providers. The
/// generator's `free` callback is invoked once the chat no longer needs it.
///
/// # Safety
///
/// `out` must be a valid pointer that points to a pointer. `generator` must
/// be a valid pointer to a `NativeGenerator` value, and all fields must be
/// either valid pointers or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_builder_new_native(
    out: *mut *mut c_void,
    generator: *const NativeGenerator,
) -> ErrorCode {
    if generator.is_null() {
        return ErrorCode::Invalid;
    }
    // SAFETY: Assume the caller has provided the valid pointer.
    let generator = unsafe { *generator };
    let provider = NativeProvider {
        generator: Arc::new(Shared { inner: generator }),
    };
    let config =
        ChatConfigBuilder::default().with_reveal_delay(NATIVE_REVEAL_DELAY);
    let wrapper_ptr = new_builder_wrapper(
        ChatBuilder::with_reply_provider(provider),
        config,
    );
    // SAFETY: Assume `out` is valid and properly aligned.
    unsafe {
        (out as *mut *mut ChatBuilderWrapper).write(wrapper_ptr);
    }

    ErrorCode::Ok
}

/// Sets the delay between two revealed chars, in milliseconds.
///
/// # Safety
///
/// `builder` must be a valid pointer returned from the creation functions of
/// chat builder.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_builder_set_reveal_delay_ms(
    builder: *mut c_void,
    delay_ms: u64,
) {
    // SAFETY: Assume the caller has provided the valid pointer.
    let wrapper = unsafe { &mut *(builder as *mut ChatBuilderWrapper) };
    let config = std::mem::take(&mut wrapper.config);
    wrapper.config =
        config.with_reveal_delay(std::time::Duration::from_millis(delay_ms));
}

/// Sets the reply revealed when the generator fails.
///
/// # Safety
///
/// `builder` must be a valid pointer returned from the creation functions of
/// chat builder. `reply` must contain a valid nul terminator at the end of
/// the string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_builder_set_fallback_reply(
    builder: *mut c_void,
    reply: *const c_char,
) -> ErrorCode {
    let Ok(reply) = unsafe { CStr::from_ptr(reply) }.to_str() else {
        return ErrorCode::Invalid;
    };
    // SAFETY: Assume the caller has provided the valid pointer.
    let wrapper = unsafe { &mut *(builder as *mut ChatBuilderWrapper) };
    let config = std::mem::take(&mut wrapper.config);
    wrapper.config = config.with_fallback_reply(reply);

    ErrorCode::Ok
}

/// Sets the callbacks for the chat builder.
///
/// # Safety
///
/// `builder` must be a valid pointer returned from the creation functions of
/// chat builder. `callbacks` must be a valid pointer to `ChatCallbacks`
/// value, and all fields must be either valid pointers or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_builder_set_callbacks(
    builder: *mut c_void,
    callbacks: *const ChatCallbacks,
) {
    // SAFETY: Assume the callback is valid.
    let callbacks = unsafe { *callbacks };
    let shared = Arc::new(Shared { inner: callbacks });

    // SAFETY: Assume the caller has provided the valid pointer.
    let wrapper = unsafe { &mut *(builder as *mut ChatBuilderWrapper) };
    let Some(mut builder) = wrapper.builder.take() else {
        return;
    };
    if let Some(on_entry_changed) = callbacks.on_entry_changed {
        builder = builder.on_entry_changed({
            let shared = Arc::clone(&shared);
            move |index, entry| {
                let origin = match entry.origin {
                    Origin::User => 0,
                    Origin::Assistant => 1,
                };
                let (text, image) = match &entry.content {
                    Content::Text { text } => (Some(text.as_str()), None),
                    Content::Image { image } => (None, Some(image.as_str())),
                    Content::TextAndImage { text, image } => {
                        (Some(text.as_str()), Some(image.as_str()))
                    }
                };
                let (text_ptr, text_len) = raw_parts(text);
                let (image_ptr, image_len) = raw_parts(image);
                unsafe {
                    on_entry_changed(
                        shared.user_info,
                        index,
                        origin,
                        text_ptr,
                        text_len,
                        image_ptr,
                        image_len,
                    )
                };
            }
        });
    }
    if let Some(on_typing_changed) = callbacks.on_typing_changed {
        builder = builder.on_typing_changed({
            let shared = Arc::clone(&shared);
            move |typing| {
                unsafe { on_typing_changed(shared.user_info, typing) };
            }
        });
    }
    if let Some(on_idle) = callbacks.on_idle {
        builder = builder.on_idle({
            let shared = Arc::clone(&shared);
            move || {
                unsafe { on_idle(shared.user_info) };
            }
        });
    }
    wrapper.builder = Some(builder);
}

fn raw_parts(s: Option<&str>) -> (*const c_char, usize) {
    match s {
        Some(s) => (s.as_ptr() as *const c_char, s.len()),
        None => (ptr::null(), 0),
    }
}

/// Frees a previously initialized chat builder.
///
/// # Safety
///
/// `builder` must be a valid pointer returned from the creation functions of
/// chat builder.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_builder_free(builder: *mut c_void) {
    // SAFETY: Assume the caller has provided the valid pointer.
    unsafe {
        drop(Box::from_raw(builder as *mut ChatBuilderWrapper));
    }
}

/// Builds a chat from a previously initialized chat builder.
///
/// Note that the chat builder is consumed and cannot be used again after
/// this call. Returns null if the builder has already been consumed.
///
/// # Safety
///
/// `builder` must be a valid pointer returned from the creation functions of
/// chat builder.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_builder_build(
    builder: *mut c_void,
) -> *mut c_void {
    // We must enter the runtime before building the chat, since it will
    // spawn the chat task, which requires a runtime.
    let runtime = &*TOKIO_RUNTIME;
    let _enter = runtime.enter();

    // SAFETY: Assume the caller has provided the valid pointer.
    let mut wrapper =
        unsafe { Box::from_raw(builder as *mut ChatBuilderWrapper) };
    let Some(builder) = wrapper.builder.take() else {
        return ptr::null_mut();
    };
    let config = std::mem::take(&mut wrapper.config).build();
    let chat = builder.with_config(config).build();
    Box::into_raw(Box::new(chat)) as _
}

/// Sends a message to the chat.
///
/// `image_uri` may be null if no image is attached. Blank text without an
/// image is ignored.
///
/// # Safety
///
/// `chat` must be a valid pointer returned from `chatllm_chat_builder_build`.
/// Strings must contain a valid nul terminator at the end of the string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_send_message(
    chat: *mut c_void,
    text: *const c_char,
    image_uri: *const c_char,
) -> ErrorCode {
    let Ok(text) = unsafe { CStr::from_ptr(text) }.to_str() else {
        return ErrorCode::Invalid;
    };
    let image = if image_uri.is_null() {
        None
    } else {
        let Ok(uri) = unsafe { CStr::from_ptr(image_uri) }.to_str() else {
            return ErrorCode::Invalid;
        };
        Some(ImageRef::new(uri))
    };

    // SAFETY: Assume the caller has provided the valid pointer.
    let chat = unsafe { &*(chat as *mut Chat) };
    chat.send_message(text, image);

    ErrorCode::Ok
}

/// Stops and frees a chat. A reply that is still being revealed stops where
/// it is.
///
/// The chat stops shortly after this call returns, not before: a callback
/// that is already running may still complete. The callbacks' `free` is
/// invoked once the chat has stopped, and no callbacks follow it.
///
/// # Safety
///
/// `chat` must be a valid pointer returned from `chatllm_chat_builder_build`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_chat_free(chat: *mut c_void) {
    // SAFETY: Assume the caller has provided the valid pointer.
    let chat = unsafe { Box::from_raw(chat as *mut Chat) };
    chat.shutdown();
}

/// Writes (appends) reply text to a sink handed to a native generator.
///
/// # Safety
///
/// `sink` must be the pointer passed to the current `generate` call. `text`
/// must point to `len` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn chatllm_reply_sink_write(
    sink: *mut c_void,
    text: *const c_char,
    len: usize,
) -> ErrorCode {
    if sink.is_null() || (text.is_null() && len > 0) {
        return ErrorCode::Invalid;
    }
    let bytes = if len == 0 {
        &[][..]
    } else {
        // SAFETY: Assume the caller has provided the valid pointer.
        unsafe { std::slice::from_raw_parts(text as *const u8, len) }
    };
    let Ok(text) = std::str::from_utf8(bytes) else {
        return ErrorCode::Invalid;
    };
    // SAFETY: Assume the caller has provided the valid pointer.
    let sink = unsafe { &mut *(sink as *mut ReplySink) };
    sink.reply.get_or_insert_with(String::new).push_str(text);

    ErrorCode::Ok
}
