use crate::ui::visualizer_context::VisualizerContext;
use leptos::web_sys;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

/// Listen for `message` events on the window and hand them to the store.
///
/// Hosts may post either a structured object or a JSON string.
pub fn listen_for_external_config(ctx: VisualizerContext) {
    let Some(window) = web_sys::window() else {
        leptos::logging::warn!("No window, external configuration disabled");
        return;
    };

    let handler = Closure::<dyn Fn(web_sys::MessageEvent)>::new(move |e: web_sys::MessageEvent| {
        let data = e.data();
        let message = match data.as_string() {
            Some(text) => serde_json::from_str::<serde_json::Value>(&text).map_err(|e| e.to_string()),
            None => serde_wasm_bindgen::from_value::<serde_json::Value>(data)
                .map_err(|e| e.to_string()),
        };
        match message {
            Ok(message) => ctx.handle_external_message(&message),
            Err(err) => leptos::logging::warn!("Ignoring undecodable message: {}", err),
        }
    });

    if let Err(err) =
        window.add_event_listener_with_callback("message", handler.as_ref().unchecked_ref())
    {
        leptos::logging::warn!("Failed to listen for external configuration: {:?}", err);
    }

    // Keep the closure alive
    handler.forget();
}
