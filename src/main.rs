mod app;
mod launch;
mod library;
mod picture;
mod session;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli_args = std::env::args().skip(1).collect::<Vec<_>>();
    let (options, initial_status) = match launch::parse_launch_options_from_args(&cli_args) {
        Ok(options) => (options, None),
        Err(err) => {
            log::warn!("Ignoring launch arguments: {err}");
            (Default::default(), Some(format!("Launch args error: {err}")))
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([640.0, 480.0])
            .with_title(app::APP_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        app::APP_TITLE,
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(app::PictureDescriptorApp::new(
                options,
                initial_status,
            )?))
        }),
    )
}
