use std::{collections::HashMap, path::PathBuf, sync::Arc, thread, time::Duration};

mod config;
mod sound;

use clap::Parser;
use client_core::{
    CharacterDataSource, DetailFetcher, DetailState, HttpCharacterSource, ListController,
    ListState,
};
use config::Settings;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use eframe::egui;
use egui::TextureHandle;
use reqwest::Client as HttpClient;
use shared::domain::{CharacterId, CharacterSummary};
use tracing::warn;

enum BackendCommand {
    FetchInitial,
    Search { query: String },
    LoadMore,
    LoadDetail { id: CharacterId },
    FetchPortrait { id: CharacterId, url: String },
}

enum UiEvent {
    ListState(ListState),
    DetailState {
        id: CharacterId,
        state: DetailState,
    },
    PortraitLoaded {
        id: CharacterId,
        image: PortraitImage,
    },
    PortraitFailed {
        id: CharacterId,
    },
}

#[derive(Clone)]
struct PortraitImage {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

enum PortraitState {
    Loading,
    Ready(TextureHandle),
    Failed,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum View {
    List,
    Detail(CharacterId),
}

struct ExplorerApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    search_input: String,
    list: ListState,
    detail: DetailState,
    view: View,
    portraits: HashMap<CharacterId, PortraitState>,
    entry_sound: Option<PathBuf>,
}

impl ExplorerApp {
    fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>, settings: Settings) -> Self {
        let mut list = ListState::default();
        list.loading = true;
        queue_command(&cmd_tx, BackendCommand::FetchInitial);

        Self {
            cmd_tx,
            ui_rx,
            search_input: String::new(),
            list,
            detail: DetailState::default(),
            view: View::List,
            portraits: HashMap::new(),
            entry_sound: settings.entry_sound,
        }
    }

    fn drain_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::ListState(state) => self.list = state,
                UiEvent::DetailState { id, state } => {
                    // A snapshot for a character we already navigated away
                    // from is stale; the latest navigation wins.
                    if self.view == View::Detail(id) {
                        self.detail = state;
                    }
                }
                UiEvent::PortraitLoaded { id, image } => {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    let texture = ctx.load_texture(
                        format!("portrait-{}", id.0),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.portraits.insert(id, PortraitState::Ready(texture));
                }
                UiEvent::PortraitFailed { id } => {
                    self.portraits.insert(id, PortraitState::Failed);
                }
            }
        }
    }

    fn ensure_portrait(&mut self, id: CharacterId, url: &str) {
        if self.portraits.contains_key(&id) {
            return;
        }
        self.portraits.insert(id, PortraitState::Loading);
        queue_command(
            &self.cmd_tx,
            BackendCommand::FetchPortrait {
                id,
                url: url.to_string(),
            },
        );
    }

    fn submit_search(&mut self) {
        self.list.loading = true;
        queue_command(
            &self.cmd_tx,
            BackendCommand::Search {
                query: self.search_input.clone(),
            },
        );
    }

    fn open_detail(&mut self, id: CharacterId) {
        self.view = View::Detail(id);
        self.detail = DetailState {
            loading: true,
            ..DetailState::default()
        };
        sound::play_entry_sound(self.entry_sound.as_deref());
        queue_command(&self.cmd_tx, BackendCommand::LoadDetail { id });
    }

    fn render_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Rick and Morty Explorer");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.search_input)
                    .hint_text("Search characters")
                    .desired_width(320.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Search").clicked() || submitted {
                self.submit_search();
            }
        });
        ui.add_space(6.0);

        if self.list.loading && self.list.items.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.spinner();
            });
            return;
        }

        // Shown both when the collection is empty and after a failed fetch
        // that left nothing on screen.
        if self.list.items.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label("No characters found");
            });
            return;
        }

        let items = self.list.items.clone();
        let mut clicked: Option<CharacterId> = None;
        let output = egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for row in items.chunks(2) {
                    ui.columns(2, |columns| {
                        for (column, item) in columns.iter_mut().zip(row) {
                            if self.render_card(column, item) {
                                clicked = Some(item.id);
                            }
                        }
                    });
                }
                if self.list.loading {
                    ui.vertical_centered(|ui| {
                        ui.add_space(8.0);
                        ui.spinner();
                        ui.add_space(8.0);
                    });
                }
            });

        if let Some(id) = clicked {
            self.open_detail(id);
            return;
        }

        if self.list.has_more
            && !self.list.loading
            && should_request_more(
                output.state.offset.y,
                output.inner_rect.height(),
                output.content_size.y,
            )
        {
            self.list.loading = true;
            queue_command(&self.cmd_tx, BackendCommand::LoadMore);
        }
    }

    fn render_card(&mut self, ui: &mut egui::Ui, item: &CharacterSummary) -> bool {
        self.ensure_portrait(item.id, &item.image);

        let response = egui::Frame::group(ui.style())
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    match self.portraits.get(&item.id) {
                        Some(PortraitState::Ready(texture)) => {
                            ui.add(
                                egui::Image::new(texture)
                                    .fit_to_exact_size(egui::vec2(120.0, 120.0)),
                            );
                        }
                        Some(PortraitState::Failed) => {
                            ui.label("(no portrait)");
                        }
                        _ => {
                            ui.spinner();
                        }
                    }
                    ui.label(egui::RichText::new(&item.name).strong());
                    ui.label(card_subtitle(item));
                });
            })
            .response
            .interact(egui::Sense::click());
        response.clicked()
    }

    fn render_detail(&mut self, ui: &mut egui::Ui, id: CharacterId) {
        if ui.button("< Back").clicked() {
            self.view = View::List;
            return;
        }
        ui.add_space(8.0);

        if self.detail.loading {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.spinner();
            });
            return;
        }

        // Covers both a 404 and a transport failure.
        let Some(character) = self.detail.character.clone() else {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label("Character not found");
            });
            return;
        };

        self.ensure_portrait(id, &character.image);
        ui.vertical_centered(|ui| {
            match self.portraits.get(&id) {
                Some(PortraitState::Ready(texture)) => {
                    ui.add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(220.0, 220.0)));
                }
                Some(PortraitState::Failed) => {
                    ui.label("(no portrait)");
                }
                _ => {
                    ui.spinner();
                }
            }
            ui.add_space(8.0);
            ui.heading(&character.name);
        });
        ui.add_space(8.0);
        ui.label(format!("Status: {}", character.status));
        ui.label(format!("Species: {}", character.species));
        ui.label(format!("Gender: {}", character.gender));
        ui.label(format!("Origin: {}", character.origin.name));
        ui.label(format!("Last known location: {}", character.location.name));
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_ui_events(ctx);

        let view = self.view;
        egui::CentralPanel::default().show(ctx, |ui| match view {
            View::List => self.render_list(ui),
            View::Detail(id) => self.render_detail(ui, id),
        });

        // Backend snapshots arrive over the channel, so keep polling even
        // without input events.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

fn card_subtitle(item: &CharacterSummary) -> String {
    format!("{} - {}", item.status, item.species)
}

/// True once the scroll position is within half a viewport of the bottom.
fn should_request_more(offset_y: f32, viewport_height: f32, content_height: f32) -> bool {
    content_height - (offset_y + viewport_height) < viewport_height * 0.5
}

fn queue_command(cmd_tx: &Sender<BackendCommand>, cmd: BackendCommand) {
    let label = match &cmd {
        BackendCommand::FetchInitial => "fetch_initial",
        BackendCommand::Search { .. } => "search",
        BackendCommand::LoadMore => "load_more",
        BackendCommand::LoadDetail { .. } => "load_detail",
        BackendCommand::FetchPortrait { .. } => "fetch_portrait",
    };
    match cmd_tx.try_send(cmd) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!("backend command queue full, dropping {label}");
        }
        Err(TrySendError::Disconnected(_)) => {
            warn!("backend worker gone, dropping {label}");
        }
    }
}

async fn fetch_portrait(http: HttpClient, url: String) -> Result<PortraitImage, String> {
    let bytes = http
        .get(&url)
        .send()
        .await
        .map_err(|err| err.to_string())?
        .error_for_status()
        .map_err(|err| err.to_string())?
        .bytes()
        .await
        .map_err(|err| err.to_string())?;
    let decoded = image::load_from_memory(&bytes).map_err(|err| err.to_string())?;
    let rgba = decoded.to_rgba8();
    Ok(PortraitImage {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        rgba: rgba.into_raw(),
    })
}

fn spawn_backend_thread(
    settings: Settings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let source: Arc<dyn CharacterDataSource> =
                Arc::new(HttpCharacterSource::new(settings.api_base_url.clone()));
            let list = Arc::new(ListController::new(Arc::clone(&source)));
            let http = HttpClient::new();

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::FetchInitial => {
                        let list = Arc::clone(&list);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            list.fetch_page(1, "").await;
                            let _ = ui_tx.try_send(UiEvent::ListState(list.state().await));
                        });
                    }
                    BackendCommand::Search { query } => {
                        let list = Arc::clone(&list);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            list.search(&query).await;
                            let _ = ui_tx.try_send(UiEvent::ListState(list.state().await));
                        });
                    }
                    BackendCommand::LoadMore => {
                        let list = Arc::clone(&list);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            list.load_more().await;
                            let _ = ui_tx.try_send(UiEvent::ListState(list.state().await));
                        });
                    }
                    BackendCommand::LoadDetail { id } => {
                        // One fetcher per navigation; overlapping opens race
                        // and the UI keeps the snapshot for its current view.
                        let fetcher = DetailFetcher::new(Arc::clone(&source));
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            fetcher.load(id).await;
                            let _ = ui_tx.try_send(UiEvent::DetailState {
                                id,
                                state: fetcher.state().await,
                            });
                        });
                    }
                    BackendCommand::FetchPortrait { id, url } => {
                        let http = http.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            match fetch_portrait(http, url).await {
                                Ok(image) => {
                                    let _ =
                                        ui_tx.try_send(UiEvent::PortraitLoaded { id, image });
                                }
                                Err(err) => {
                                    warn!(id = id.0, "portrait fetch failed: {err}");
                                    let _ = ui_tx.try_send(UiEvent::PortraitFailed { id });
                                }
                            }
                        });
                    }
                }
            }
        });
    });
}

#[derive(Parser, Debug)]
#[command(name = "rickdex", about = "Rick and Morty character browser")]
struct Args {
    /// Override the API base url.
    #[arg(long)]
    api_url: Option<String>,
    /// Sound file played when opening a character.
    #[arg(long)]
    entry_sound: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let mut settings = config::load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_base_url = config::normalize_api_base_url(&api_url);
    }
    if let Some(entry_sound) = args.entry_sound {
        settings.entry_sound = Some(entry_sound);
    }

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    spawn_backend_thread(settings.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Rick and Morty Explorer")
            .with_inner_size([480.0, 840.0])
            .with_min_inner_size([360.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Rick and Morty Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(ExplorerApp::new(cmd_tx, ui_rx, settings)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::CharacterId;

    fn item(status: &str, species: &str) -> CharacterSummary {
        CharacterSummary {
            id: CharacterId(1),
            name: "Rick Sanchez".to_string(),
            status: status.to_string(),
            species: species.to_string(),
            image: String::new(),
        }
    }

    #[test]
    fn card_subtitle_joins_status_and_species() {
        assert_eq!(card_subtitle(&item("Alive", "Human")), "Alive - Human");
        assert_eq!(card_subtitle(&item("unknown", "Alien")), "unknown - Alien");
    }

    #[test]
    fn requests_more_only_near_the_bottom() {
        // Scrolled to the top of a long list: plenty of content left.
        assert!(!should_request_more(0.0, 800.0, 4000.0));
        // Exactly half a viewport from the end is still outside.
        assert!(!should_request_more(2800.0, 800.0, 4000.0));
        // Just inside the threshold.
        assert!(should_request_more(2900.0, 800.0, 4000.0));
        // Content shorter than the viewport always asks for more.
        assert!(should_request_more(0.0, 800.0, 400.0));
    }
}
