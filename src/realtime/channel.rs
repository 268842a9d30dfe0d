use super::{parse_frame, Frame, RealtimeEvent, PING_FRAME, PONG_FRAME};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

const RECONNECT_DELAY_MS: i32 = 5_000;

/// Open the realtime socket and feed page events to `on_event`.
///
/// The connection lives for the whole page; it is re-established after a close.
pub(crate) fn connect(url: String, on_event: Rc<dyn Fn(RealtimeEvent)>) {
    let socket = match web_sys::WebSocket::new(&url) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(%url, ?e, "failed to open realtime socket");
            schedule_reconnect(url, on_event);
            return;
        }
    };

    let ping_timer: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

    let ws = socket.clone();
    let timer = ping_timer.clone();
    let handler = on_event.clone();
    let on_message = Closure::wrap(Box::new(move |ev: web_sys::MessageEvent| {
        let Some(text) = ev.data().as_string() else {
            return;
        };
        match parse_frame(&text) {
            Frame::Open { ping_interval_ms } => {
                tracing::debug!(ping_interval_ms, "realtime socket open");
                start_ping(&ws, &timer, ping_interval_ms);
            }
            Frame::Ping => {
                let _ = ws.send_with_str(PONG_FRAME);
            }
            Frame::Event(event) => {
                tracing::debug!(channel = %event.channel, path = %event.page.path, "realtime event");
                (*handler)(event);
            }
            Frame::Pong | Frame::Ignored => {}
        }
    }) as Box<dyn FnMut(web_sys::MessageEvent)>);
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    on_message.forget();

    let timer = ping_timer;
    let on_close = Closure::once_into_js(move |_ev: web_sys::Event| {
        if let (Some(id), Some(win)) = (timer.take(), web_sys::window()) {
            win.clear_interval_with_handle(id);
        }
        tracing::warn!("realtime socket closed; reconnecting");
        schedule_reconnect(url, on_event);
    });
    socket.set_onclose(Some(on_close.unchecked_ref()));
}

fn start_ping(ws: &web_sys::WebSocket, timer: &Rc<Cell<Option<i32>>>, interval_ms: i32) {
    let Some(win) = web_sys::window() else {
        return;
    };
    if let Some(old) = timer.take() {
        win.clear_interval_with_handle(old);
    }

    let ws = ws.clone();
    let cb = Closure::wrap(Box::new(move || {
        let _ = ws.send_with_str(PING_FRAME);
    }) as Box<dyn FnMut()>);

    let id = win
        .set_interval_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            interval_ms.max(1_000),
        )
        .ok();
    timer.set(id);
    cb.forget();
}

fn schedule_reconnect(url: String, on_event: Rc<dyn Fn(RealtimeEvent)>) {
    let Some(win) = web_sys::window() else {
        return;
    };
    let cb = Closure::once_into_js(move || connect(url, on_event));
    let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
        cb.unchecked_ref(),
        RECONNECT_DELAY_MS,
    );
}
