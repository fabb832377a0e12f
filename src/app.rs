use std::fs;

use anyhow::{Context, Result};
use eframe::egui::{self, Sense, TextureHandle, TextureOptions, ViewportId};

use crate::launch::LaunchOptions;
use crate::library::{HttpFetcher, RandomIds};
use crate::session::{PanelContent, Session, ShowOutcome};

pub const APP_TITLE: &str = "Picture Descriptor";
const PANEL_VIEWPORT: &str = "picture-panel";
const ERROR_PANEL_SIZE: [f32; 2] = [460.0, 80.0];
const URL_COLOR: egui::Color32 = egui::Color32::from_rgb(90, 150, 255);

#[derive(Default)]
struct PanelAction {
    close: bool,
    save: bool,
}

pub struct PictureDescriptorApp {
    session: Session,
    fetcher: HttpFetcher,
    ids: RandomIds,
    picture_texture: Option<TextureHandle>,
    texture_revision: Option<u64>,
    status_line: String,
}

impl PictureDescriptorApp {
    pub fn new(options: LaunchOptions, initial_status: Option<String>) -> Result<Self> {
        let ids = RandomIds::new(options.config.id_range.clone());
        let mut session = Session::new(options.config);
        if let Some(id) = options.initial_id {
            session.queue_description(id);
        }
        Ok(Self {
            session,
            fetcher: HttpFetcher::new()?,
            ids,
            picture_texture: None,
            texture_revision: None,
            status_line: initial_status.unwrap_or_default(),
        })
    }

    fn get_random_description(&mut self) {
        let result = self
            .session
            .get_random_description(&mut self.ids, &self.fetcher);
        self.report_description(result);
    }

    fn load_queued_description(&mut self) {
        if let Some(result) = self.session.load_queued_description(&self.fetcher) {
            self.report_description(result);
        }
    }

    fn report_description(&mut self, result: Result<()>) {
        self.status_line = description_status(result);
    }

    fn show_picture(&mut self) {
        if self.session.show_picture(&self.fetcher) == ShowOutcome::Reused {
            log::debug!("Image panel already holds {}", self.session.photo_url());
        }
    }

    fn sync_picture_texture(&mut self, ctx: &egui::Context) {
        let panel = self.session.panel();
        if self.texture_revision == Some(panel.revision()) {
            return;
        }
        self.texture_revision = Some(panel.revision());

        let PanelContent::Picture(picture) = panel.content() else {
            self.picture_texture = None;
            return;
        };
        log::debug!("Uploading {}x{} picture texture", picture.width(), picture.height());
        if let Some(texture) = self.picture_texture.as_mut() {
            texture.set(picture.image.clone(), TextureOptions::LINEAR);
        } else {
            self.picture_texture = Some(ctx.load_texture(
                "library-picture",
                picture.image.clone(),
                TextureOptions::LINEAR,
            ));
        }
    }

    fn show_picture_panel(&mut self, ctx: &egui::Context) {
        let panel = self.session.panel();
        if !panel.is_visible() {
            return;
        }

        let texture = self.picture_texture.as_ref();
        let inner_size = texture
            .map(|texture| texture.size_vec2())
            .unwrap_or_else(|| ERROR_PANEL_SIZE.into());
        let builder = egui::ViewportBuilder::default()
            .with_title(panel.title())
            .with_inner_size(inner_size)
            .with_resizable(false);

        let action = ctx.show_viewport_immediate(
            ViewportId::from_hash_of(PANEL_VIEWPORT),
            builder,
            |ctx, _class| {
                let mut action = PanelAction::default();
                egui::CentralPanel::default()
                    .frame(egui::Frame::none().fill(ctx.style().visuals.panel_fill))
                    .show(ctx, |ui| match (panel.content(), texture) {
                        (PanelContent::Picture(_), Some(texture)) => {
                            let response = ui.add(
                                egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                                    .sense(Sense::click()),
                            );
                            response.context_menu(|ui| {
                                if ui.button("Save image…").clicked() {
                                    action.save = true;
                                    ui.close_menu();
                                }
                            });
                        }
                        (PanelContent::Error(message), _) => {
                            ui.add_space(2.0);
                            ui.label(message);
                        }
                        _ => {}
                    });

                if ctx.input(|input| input.viewport().close_requested()) {
                    action.close = true;
                }
                action
            },
        );

        if action.close {
            self.session.hide_picture();
        }
        if action.save {
            self.save_picture();
        }
    }

    fn save_picture(&mut self) {
        let PanelContent::Picture(picture) = self.session.panel().content() else {
            return;
        };
        let extension = image::guess_format(&picture.raw)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("jpg");
        let file_name = format!(
            "item-{}.{extension}",
            self.session.last_shown_id().unwrap_or_default()
        );
        let Some(path) = rfd::FileDialog::new().set_file_name(file_name).save_file() else {
            return;
        };

        match fs::write(&path, &picture.raw)
            .with_context(|| format!("Could not write image to {}", path.display()))
        {
            Ok(()) => {
                log::info!("Saved image to {}", path.display());
                self.status_line = format!("Saved {}", path.display());
            }
            Err(err) => {
                log::warn!("{err:#}");
                self.status_line = format!("{err:#}");
            }
        }
    }
}

impl eframe::App for PictureDescriptorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.load_queued_description();

        let mut get_clicked = false;
        let mut show_clicked = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                if ui.button("Get a Random Description").clicked() {
                    get_clicked = true;
                }
            });
            ui.add_space(4.0);

            egui::Grid::new("item-fields")
                .num_columns(2)
                .show(ui, |ui| {
                    ui.label("Item ID: ");
                    ui.label(
                        self.session
                            .current_id()
                            .map(|id| id.to_string())
                            .unwrap_or_default(),
                    );
                    ui.end_row();

                    ui.label("Item URL: ");
                    let mut url = self.session.item_url();
                    let response = ui
                        .add(
                            egui::TextEdit::singleline(&mut url)
                                .desired_width(480.0)
                                .text_color(URL_COLOR),
                        )
                        .on_hover_cursor(egui::CursorIcon::PointingHand);
                    if response.clicked() && !url.is_empty() {
                        ui.ctx().open_url(egui::OpenUrl::new_tab(url));
                    }
                    ui.end_row();
                });

            ui.add_space(4.0);
            ui.group(|ui| {
                ui.label("Description:");
                let mut description = self.session.description();
                ui.add(
                    egui::TextEdit::multiline(&mut description)
                        .desired_rows(15)
                        .desired_width(f32::INFINITY),
                );
            });

            ui.add_space(4.0);
            ui.vertical_centered(|ui| {
                if ui.button("Show Image").clicked() {
                    show_clicked = true;
                }
            });

            if !self.status_line.is_empty() {
                ui.separator();
                ui.colored_label(ui.visuals().warn_fg_color, &self.status_line);
            }
        });

        if get_clicked {
            self.get_random_description();
        }
        if show_clicked {
            self.show_picture();
        }

        self.sync_picture_texture(ctx);
        self.show_picture_panel(ctx);
    }
}

fn description_status(result: Result<()>) -> String {
    match result {
        Ok(()) => String::new(),
        Err(err) => {
            log::warn!("{err:#}");
            format!("Network error: {err:#}")
        }
    }
}
