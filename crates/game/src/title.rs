use quizfield_engine::{Canvas, ImageStore, Rgba, TextStyle};

const TITLE_FILL: Rgba = Rgba::rgb(20, 20, 40);
const START_PROMPT: &str = "CLICK OR PRESS Z TO START";
const CONTINUE_HINT: &str = "F9 TO CONTINUE";
/// The prompt is shown for the first half of each period.
const BLINK_PERIOD_FRAMES: u32 = 60;

#[derive(Debug, Default)]
pub(crate) struct TitleScreen {
    frame: u32,
}

impl TitleScreen {
    pub(crate) fn tick(&mut self) {
        self.frame = (self.frame + 1) % BLINK_PERIOD_FRAMES;
    }

    pub(crate) fn prompt_visible(&self) -> bool {
        self.frame < BLINK_PERIOD_FRAMES / 2
    }

    pub(crate) fn draw(
        &self,
        canvas: &mut dyn Canvas,
        images: &mut ImageStore,
        title: &str,
        title_image: Option<&str>,
    ) {
        let (screen_width, screen_height) = canvas.size();
        let image =
            title_image.and_then(|key| images.sized(key, screen_width, screen_height, false));
        let (width, height) = (screen_width as i32, screen_height as i32);
        match image {
            Some(image) => canvas.draw_image(&image, 0, 0),
            None => {
                canvas.clear(TITLE_FILL);
                let style = TextStyle::new(Rgba::WHITE).with_scale(8);
                let x = (width - style.text_width(title)) / 2;
                canvas.draw_text(title, x, height / 3, style);
            }
        }

        let prompt_style = TextStyle::new(Rgba::WHITE);
        if self.prompt_visible() {
            let x = (width - prompt_style.text_width(START_PROMPT)) / 2;
            canvas.draw_text(START_PROMPT, x, height - 80, prompt_style);
        }
        let hint_style = TextStyle::new(Rgba::rgb(180, 180, 180)).with_scale(2);
        let x = (width - hint_style.text_width(CONTINUE_HINT)) / 2;
        canvas.draw_text(CONTINUE_HINT, x, height - 40, hint_style);
    }
}
