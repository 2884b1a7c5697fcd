use anyhow::Context;
use clap::Parser;
use client::{BackendClient, HttpFrameFetcher, Submission};
use iced::{
    event, keyboard,
    widget::{
        button, column, container, image, opaque, row, scrollable, stack, text, text_input,
        Column, Container,
    },
    window, Alignment, Color, Element, Event, Length, Subscription, Task, Theme,
};
use log::{info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use vistacore::index::format_duration;
use vistacore::manifest::{ProcessRequest, ProcessResponse, ResultPaths, SummaryPayload};
use vistacore::modal::{
    ElementId, FramePreloader, KeyOutcome, ModalControl, NavKey, PreloadCompletion,
    PreloadDisposition, PreloadOutcome, PreloadRequest, StandardScope,
};
use vistacore::{DetectionIndexBuilder, DetectionManifest, ModalNavigationController, ViewerConfig};

mod client;
mod keys;

/// Class-list entries get ids above anything the modal hands out.
const CLASS_ELEMENT_BASE: u32 = 10_000;
const MAX_HISTORY: usize = 20;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Desktop viewer for processed detection results")]
struct Args {
    /// Base URL of the processing backend
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server: String,
    /// Load existing results for this video on start
    #[arg(long)]
    video_id: Option<String>,
    /// Viewer settings (zoom limits, detail length, preload timeout) as YAML
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_viewer_config(path)?,
        None => ViewerConfig::default(),
    };

    iced::application(
        move || Viewer::boot(args.clone(), config.clone()),
        Viewer::update,
        Viewer::view,
    )
    .title(application_title)
    .subscription(application_subscription)
    .theme(application_theme)
    .run()?;
    Ok(())
}

fn load_viewer_config(path: &Path) -> anyhow::Result<ViewerConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading viewer config {}", path.display()))?;
    let config: ViewerConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing viewer config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("checking viewer config {}", path.display()))?;
    Ok(config)
}

fn application_title(state: &Viewer) -> String {
    match &state.results {
        Some(results) => format!("VISTA Viewer - {}", results.video_id),
        None => "VISTA Viewer".into(),
    }
}

fn application_subscription(_: &Viewer) -> Subscription<Message> {
    event::listen_with(keyboard_event)
}

fn keyboard_event(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
            keys::nav_key(&key, modifiers).map(Message::Key)
        }
        _ => None,
    }
}

fn application_theme(_: &Viewer) -> Theme {
    Theme::Dark
}

struct Viewer {
    client: BackendClient,
    config: ViewerConfig,
    form: SubmitForm,
    busy: bool,
    status: String,
    error: Option<String>,
    /// Video whose manifest was requested last; older replies are dropped.
    pending_video: Option<String>,
    response: Option<ProcessResponse>,
    results: Option<ResultsPanel>,
    controller: ModalNavigationController,
    preloader: Option<Arc<FramePreloader<HttpFrameFetcher>>>,
    frame: Option<ShownFrame>,
    focused_class: Option<usize>,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    FormChanged(FormField, String),
    Submit,
    Processed(Result<Submission, String>),
    ManifestLoaded(String, Result<DetectionManifest, String>),
    ClassSelected(usize),
    Key(NavKey),
    Control(ModalControl),
    FrameLoaded(PreloadCompletion),
}

#[derive(Debug, Clone, Copy)]
enum FormField {
    Url,
    Threshold,
    Fps,
}

struct ResultsPanel {
    video_id: String,
    title: Option<String>,
    duration: Option<f64>,
    summary: SummaryPayload,
    classes: Vec<(String, usize)>,
    links: Vec<(&'static str, String)>,
}

struct ShownFrame {
    handle: image::Handle,
    width: u32,
}

impl Viewer {
    fn boot(args: Args, config: ViewerConfig) -> (Self, Task<Message>) {
        let controller = ModalNavigationController::new(Arc::default(), config.clone());
        let mut viewer = Viewer {
            client: BackendClient::new(args.server),
            config,
            form: SubmitForm::default(),
            busy: false,
            status: "Enter a video URL to process.".into(),
            error: None,
            pending_video: None,
            response: None,
            results: None,
            controller,
            preloader: None,
            frame: None,
            focused_class: None,
            history: Vec::new(),
        };
        let task = match args.video_id {
            Some(video_id) => {
                viewer.status = format!("Loading results for {video_id}...");
                viewer.request_manifest(video_id)
            }
            None => Task::none(),
        };
        (viewer, task)
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::FormChanged(field, value) => {
                state.form.update_field(field, value);
                Task::none()
            }
            Message::Submit => match state.form.to_request() {
                Ok(request) => {
                    state.busy = true;
                    state.error = None;
                    state.status = "Processing...".into();
                    Task::perform(state.client.clone().process(request), Message::Processed)
                }
                Err(err) => {
                    state.error = Some(err);
                    Task::none()
                }
            },
            Message::Processed(Ok(Submission::Completed(response))) => {
                state.status = format!(
                    "Processed {}: {} detections in {} frames",
                    response.video_id,
                    response.summary.total_detections,
                    response.summary.total_frames
                );
                let video_id = response.video_id.clone();
                state.response = Some(response);
                state.request_manifest(video_id)
            }
            Message::Processed(Ok(Submission::Existing { video_id, message })) => {
                state.status = format!("{message} Loading the existing results.");
                state.response = None;
                state.request_manifest(video_id)
            }
            Message::Processed(Err(err)) => {
                state.busy = false;
                state.status = "Processing failed.".into();
                state.error = Some(err);
                Task::none()
            }
            Message::ManifestLoaded(video_id, result) => {
                if state.pending_video.as_deref() != Some(video_id.as_str()) {
                    return Task::none();
                }
                state.busy = false;
                state.pending_video = None;
                match result {
                    Ok(manifest) => state.install_manifest(video_id, manifest),
                    Err(err) => {
                        state.status = format!("Could not load results for {video_id}.");
                        state.error = Some(err);
                    }
                }
                Task::none()
            }
            Message::ClassSelected(position) => {
                let Some(class) = state
                    .results
                    .as_ref()
                    .and_then(|results| results.classes.get(position))
                    .map(|(class, _)| class.clone())
                else {
                    return Task::none();
                };
                state.focused_class = Some(position);
                state.frame = None;
                let request =
                    state
                        .controller
                        .open(&class, &StandardScope, Some(class_element(position)));
                state.preload(request)
            }
            Message::Key(key) => {
                let outcome = state.controller.handle_key(key);
                state.apply(outcome)
            }
            Message::Control(control) => {
                let outcome = state.controller.activate(control);
                state.apply(outcome)
            }
            Message::FrameLoaded(completion) => {
                let candidate = match &completion.outcome {
                    PreloadOutcome::Ready(frame) => Some(ShownFrame {
                        handle: image::Handle::from_bytes(frame.bytes.clone()),
                        width: frame.width,
                    }),
                    PreloadOutcome::Failed(_) => None,
                };
                if state.controller.complete_preload(completion) == PreloadDisposition::Applied {
                    if let Some(frame) = candidate {
                        state.frame = Some(frame);
                    }
                }
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let form_column = column![
            text("Process a video").size(26),
            text_input("Video URL", &state.form.url)
                .on_input(|value| Message::FormChanged(FormField::Url, value))
                .on_submit(Message::Submit)
                .padding(6),
            text_input("Confidence threshold (0-1)", &state.form.threshold)
                .on_input(|value| Message::FormChanged(FormField::Threshold, value))
                .padding(6),
            text_input("Frames per second", &state.form.fps)
                .on_input(|value| Message::FormChanged(FormField::Fps, value))
                .padding(6),
            button(if state.busy { "Processing..." } else { "Process" })
                .on_press_maybe((!state.busy).then_some(Message::Submit))
                .padding(10),
            text(&state.status).size(14),
            text(state.error.clone().unwrap_or_default())
                .size(14)
                .color(Color::from_rgb(0.95, 0.45, 0.4)),
            text("Activity log").size(16),
            Container::new(scrollable(history_list(&state.history)).height(Length::Fixed(160.0)))
                .padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(360.0));

        let results_column = match &state.results {
            Some(results) => results_view(results, &state.client, state.focused_class),
            None => column![
                text("Results").size(26),
                text("No results loaded yet.").size(14)
            ]
            .spacing(10),
        }
        .padding(16)
        .width(Length::Fill);

        let page = Container::new(
            row![form_column, results_column]
                .spacing(20)
                .align_y(Alignment::Start)
                .padding(20),
        )
        .width(Length::Fill)
        .height(Length::Fill);

        if state.controller.is_open() {
            stack![page, opaque(state.modal_view())].into()
        } else {
            page.into()
        }
    }

    fn modal_view(&self) -> Element<'_, Message> {
        let view = self.controller.view();
        let focused = view.focused;
        let control = |label: &str, control: ModalControl, enabled: bool| {
            control_button(label, control, enabled, focused)
        };

        let header = row![
            text(view.title.clone()).size(24),
            text(view.counter.clone()).size(16),
            control("Close", ModalControl::Close, true),
        ]
        .spacing(16)
        .align_y(Alignment::Center);

        let picture: Element<'_, Message> = match &self.frame {
            Some(frame) => image(frame.handle.clone())
                .width(Length::Fixed(frame.width as f32 * view.zoom_level as f32))
                .into(),
            None if view.is_loading => text("Loading frame...").into(),
            None => text("No frame to show.").into(),
        };

        let status_line = match (&view.error, view.is_loading) {
            (Some(err), _) => text(err.clone()).color(Color::from_rgb(0.95, 0.45, 0.4)),
            (None, true) => text("Loading..."),
            (None, false) => text(""),
        }
        .size(14);

        let frame_info = text(format!(
            "{}  {}",
            view.frame_name.clone().unwrap_or_default(),
            view.timestamp.clone().unwrap_or_default()
        ))
        .size(14);

        let controls = row![
            control("Prev", ModalControl::Prev, view.can_prev),
            control("Next", ModalControl::Next, view.can_next),
            control("-", ModalControl::ZoomOut, view.can_zoom),
            text(format!("{}%", view.zoom_percent)),
            control("+", ModalControl::ZoomIn, view.can_zoom),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let details = view
            .details
            .iter()
            .fold(Column::new().spacing(6), |col, detail| {
                let mut line = row![text(detail.text.clone()).size(12).width(Length::Fill)]
                    .spacing(8)
                    .align_y(Alignment::Center);
                if detail.truncatable {
                    let label = if detail.expanded { "Show less" } else { "Show more" };
                    line = line.push(control(
                        label,
                        ModalControl::ToggleDetail(detail.index),
                        true,
                    ));
                }
                col.push(line)
            });

        let card = container(
            column![
                header,
                container(picture)
                    .center_x(Length::Fill)
                    .height(Length::Fixed(420.0))
                    .clip(true),
                frame_info,
                status_line,
                controls,
                scrollable(details).height(Length::Fixed(140.0)),
            ]
            .spacing(12)
            .padding(20)
            .max_width(960),
        )
        .style(container::rounded_box);

        container(card)
            .center(Length::Fill)
            .style(|_theme: &Theme| container::Style {
                background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.75).into()),
                ..container::Style::default()
            })
            .into()
    }

    fn request_manifest(&mut self, video_id: String) -> Task<Message> {
        self.pending_video = Some(video_id.clone());
        self.busy = true;
        let client = self.client.clone();
        let id = video_id.clone();
        Task::perform(client.manifest(video_id), move |result| {
            Message::ManifestLoaded(id.clone(), result)
        })
    }

    fn install_manifest(&mut self, video_id: String, manifest: DetectionManifest) {
        let (index, summary) = DetectionIndexBuilder::new().build(&manifest);
        let classes = index
            .classes()
            .map(|class| {
                let count = summary.by_class.get(class).copied().unwrap_or_default();
                (class.to_string(), count)
            })
            .collect();
        self.controller.load_index(Arc::new(index));
        self.frame = None;
        self.focused_class = None;
        self.preloader = Some(Arc::new(FramePreloader::new(
            self.client.frame_fetcher(&video_id),
            &self.config,
        )));

        let response = self
            .response
            .take()
            .filter(|response| response.video_id == video_id);
        let paths = ResultPaths::new(video_id.as_str());
        let urls = response
            .as_ref()
            .map(|response| response.results.clone())
            .unwrap_or_else(|| paths.result_urls());
        let links = [
            ("Detection JSON", urls.detection_json_url),
            ("Metadata", urls.metadata_url),
            ("Output video", urls.output_video_url),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.map(|url| (label, self.client.url(&url))))
        .collect();

        info!(
            "loaded {}: {} frames, {} detections",
            video_id, summary.total_frames, summary.total_detections
        );
        self.push_history(format!(
            "{}: {} detections across {} classes",
            video_id,
            summary.total_detections,
            summary.by_class.len()
        ));
        self.results = Some(ResultsPanel {
            title: response
                .as_ref()
                .and_then(|response| response.metadata.title.clone()),
            duration: response
                .as_ref()
                .and_then(|response| response.metadata.duration),
            summary: summary.to_payload(manifest.confidence_threshold),
            classes,
            links,
            video_id,
        });
    }

    fn apply(&mut self, outcome: KeyOutcome) -> Task<Message> {
        match outcome {
            KeyOutcome::Navigated(request) => self.preload(request),
            KeyOutcome::Closed(restore) => {
                self.frame = None;
                self.focused_class = restore.and_then(class_position);
                Task::none()
            }
            KeyOutcome::Ignored
            | KeyOutcome::Zoomed(_)
            | KeyOutcome::FocusMoved(_)
            | KeyOutcome::DetailToggled(_) => Task::none(),
        }
    }

    fn preload(&self, request: Option<PreloadRequest>) -> Task<Message> {
        let (Some(request), Some(preloader)) = (request, self.preloader.clone()) else {
            return Task::none();
        };
        Task::perform(
            async move { preloader.preload(request).await },
            Message::FrameLoaded,
        )
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }
}

fn results_view<'a>(
    results: &'a ResultsPanel,
    client: &BackendClient,
    focused_class: Option<usize>,
) -> Column<'a, Message> {
    let summary = &results.summary;
    let class_list = if results.classes.is_empty() {
        Column::new().push(text("No detections above the threshold.").size(14))
    } else {
        results.classes.iter().enumerate().fold(
            Column::new().spacing(6),
            |col, (position, (class, count))| {
                let marker = if focused_class == Some(position) { "> " } else { "" };
                col.push(
                    button(text(format!("{marker}{class} ({count})")))
                        .on_press(Message::ClassSelected(position))
                        .padding(6),
                )
            },
        )
    };
    let links = results
        .links
        .iter()
        .fold(Column::new().spacing(4), |col, (label, url)| {
            col.push(text(format!("{label}: {url}")).size(12))
        });

    column![
        text(results.title.clone().unwrap_or_else(|| results.video_id.clone())).size(26),
        text(format!(
            "Duration: {}",
            results
                .duration
                .map(format_duration)
                .unwrap_or_else(|| "n/a".into())
        ))
        .size(14),
        text(format!("Video ID: {}", results.video_id)).size(14),
        text(format!("Confidence threshold: {}", summary.confidence_threshold)).size(14),
        text(format!("Frames analysed: {}", summary.total_frames)).size(14),
        text(format!("Total detections: {}", summary.total_detections)).size(14),
        text("Detected classes").size(18),
        class_list,
        text("Artifacts").size(18),
        links,
        text(format!("Served from {}", client.url("/"))).size(12),
    ]
    .spacing(10)
}

fn history_list(history: &[String]) -> Column<'_, Message> {
    if history.is_empty() {
        Column::new().push(text("No activity yet").size(12))
    } else {
        history
            .iter()
            .rev()
            .fold(Column::new().spacing(4), |col, entry| {
                col.push(text(entry.clone()).size(12))
            })
    }
}

fn class_element(position: usize) -> ElementId {
    ElementId(CLASS_ELEMENT_BASE.saturating_add(u32::try_from(position).unwrap_or(u32::MAX)))
}

fn class_position(id: ElementId) -> Option<usize> {
    id.0.checked_sub(CLASS_ELEMENT_BASE)
        .map(|position| position as usize)
}

fn control_button<'a>(
    label: &str,
    control: ModalControl,
    enabled: bool,
    focused: Option<ElementId>,
) -> Element<'a, Message> {
    button(text(control_label(label, control, focused)))
        .on_press_maybe(enabled.then_some(Message::Control(control)))
        .padding(6)
        .into()
}

fn control_label(label: &str, control: ModalControl, focused: Option<ElementId>) -> String {
    if focused == Some(control.id()) {
        format!("[{label}]")
    } else {
        label.to_string()
    }
}

#[derive(Debug, Clone)]
struct SubmitForm {
    url: String,
    threshold: String,
    fps: String,
}

impl Default for SubmitForm {
    fn default() -> Self {
        Self {
            url: String::new(),
            threshold: "0.7".into(),
            fps: "1".into(),
        }
    }
}

impl SubmitForm {
    fn update_field(&mut self, field: FormField, value: String) {
        match field {
            FormField::Url => self.url = value,
            FormField::Threshold => self.threshold = value,
            FormField::Fps => self.fps = value,
        }
    }

    fn to_request(&self) -> Result<ProcessRequest, String> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err("Please enter a video URL.".into());
        }
        let threshold: f64 = self
            .threshold
            .trim()
            .parse()
            .ok()
            .filter(|value: &f64| (0.0..=1.0).contains(value))
            .ok_or("Confidence threshold must be a number between 0 and 1.")?;
        let fps: u32 = self
            .fps
            .trim()
            .parse()
            .ok()
            .filter(|value| *value > 0)
            .ok_or("Frames per second must be a positive whole number.")?;
        if fps != 1 {
            warn!("backend samples one frame per second; fps {} is advisory", fps);
        }
        Ok(ProcessRequest::new(url, threshold, fps))
    }
}
