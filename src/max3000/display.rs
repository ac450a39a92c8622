//! The polling display component: redraws its content on every update and flips the changes.
//!
//! Content is either nothing, a single writer, or a set of pages with one writer each. A
//! writer is a plain `fn` that draws on a [`Canvas`]. Because writers are `fn` pointers, a
//! display needs no allocator and its content can live in a `static`.
//!
//! ```
//! use max3000_kit::max3000::{
//!     display::{DisplayContent, Page},
//!     frame::{Canvas, DotColor},
//! };
//!
//! fn border(it: &mut Canvas<'_, 28, 16>) {
//!     for x_index in 0..it.width() as i32 {
//!         it.draw_pixel(x_index, 0, DotColor::Light);
//!         it.draw_pixel(x_index, it.height() as i32 - 1, DotColor::Light);
//!     }
//! }
//!
//! fn checker(it: &mut Canvas<'_, 28, 16>) {
//!     for y_index in 0..it.height() as i32 {
//!         for x_index in 0..it.width() as i32 {
//!             if (x_index + y_index) % 2 == 0 {
//!                 it.draw_pixel(x_index, y_index, DotColor::Light);
//!             }
//!         }
//!     }
//! }
//!
//! let content = DisplayContent::pages([Page::new("border", border), Page::new("checker", checker)])
//!     .expect("two distinct pages are valid");
//! assert_eq!(content.page_count(), 2);
//! ```

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::{
    Error, Result,
    config::{ConfigError, MAX_PAGES, Max3000Options, UpdateInterval},
    max3000::{
        driver::{Max3000Driver, Max3000Pins},
        frame::{Canvas, DotColor, DotFrame},
        protocol::{PANEL_HEIGHT, PANEL_WIDTH},
        transition::{STEP_DELAY, Transition},
    },
};

/// Draws one update's worth of content.
pub type Writer<const W: usize, const H: usize> = fn(&mut Canvas<'_, W, H>);

/// One named page of a paged display.
#[derive(Clone, Copy)]
pub struct Page<const W: usize, const H: usize> {
    /// Page id, unique within a display.
    pub id: &'static str,
    /// Draws the page.
    pub writer: Writer<W, H>,
}

impl<const W: usize, const H: usize> Page<W, H> {
    /// A page named `id` drawn by `writer`.
    #[must_use]
    pub const fn new(id: &'static str, writer: Writer<W, H>) -> Self {
        Self { id, writer }
    }
}

/// What a display draws on each update.
#[derive(Clone, Default)]
pub enum DisplayContent<const W: usize, const H: usize> {
    /// Nothing. With auto-clear on, the display stays blank.
    #[default]
    Blank,
    /// A single writer.
    Lambda(Writer<W, H>),
    /// Pages, one of which is shown at a time.
    Pages(Vec<Page<W, H>, MAX_PAGES>),
}

impl<const W: usize, const H: usize> DisplayContent<W, H> {
    /// Collect pages, checking their count and ids.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPages`], [`ConfigError::TooManyPages`], or
    /// [`ConfigError::DuplicatePageId`].
    pub fn pages(pages: impl IntoIterator<Item = Page<W, H>>) -> Result<Self> {
        let mut collected: Vec<Page<W, H>, MAX_PAGES> = Vec::new();
        for page in pages {
            if collected.iter().any(|existing| existing.id == page.id) {
                return Err(ConfigError::DuplicatePageId.into());
            }
            collected
                .push(page)
                .map_err(|_| ConfigError::TooManyPages)?;
        }
        if collected.is_empty() {
            return Err(ConfigError::EmptyPages.into());
        }
        Ok(Self::Pages(collected))
    }

    /// Number of pages. Zero unless this is [`Pages`](Self::Pages).
    #[must_use]
    pub fn page_count(&self) -> usize {
        match self {
            Self::Pages(pages) => pages.len(),
            Self::Blank | Self::Lambda(_) => 0,
        }
    }
}

/// A MAX3000 display that redraws on a timer.
///
/// Call [`setup`](Self::setup) once, then [`update`](Self::update) on every
/// [`update_interval`](Self::update_interval) tick.
pub struct Max3000Display<P, D, const W: usize, const H: usize> {
    driver: Max3000Driver<P, D, W, H>,
    options: Max3000Options,
    content: DisplayContent<W, H>,
    current_page: usize,
    next_transition: Option<Transition>,
}

impl<P, D, const W: usize, const H: usize> Max3000Display<P, D, W, H>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Build a display and apply every option to its driver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPanelCount`] when the options' panel grid does not match
    /// `W` × `H`, or any error from [`Max3000Options::validate`].
    pub fn new(pins: Max3000Pins<P>, delay: D, options: &Max3000Options) -> Result<Self> {
        options.validate()?;
        if usize::from(options.panels_wide) * PANEL_WIDTH != W
            || usize::from(options.panels_high) * PANEL_HEIGHT != H
        {
            return Err(ConfigError::InvalidPanelCount.into());
        }

        let mut driver = Max3000Driver::new(pins, delay);
        driver.set_dissolve(options.dissolve);
        driver.set_dissolve_seed(options.dissolve_seed);
        driver.set_rotation(options.rotation);
        driver.set_board_order(options.board_order);
        driver.set_pulse_duration_us(options.pulse_duration_us);
        driver.set_constant_frame_rate(options.constant_frame_rate);
        driver.set_bitbang_delay_us(options.bitbang_delay_us);
        driver.set_invert(options.invert);

        Ok(Self {
            driver,
            options: *options,
            content: DisplayContent::Blank,
            current_page: 0,
            next_transition: None,
        })
    }

    /// Replace what the display draws. Paged content starts at its first page.
    pub fn set_content(&mut self, content: DisplayContent<W, H>) {
        self.content = content;
        self.current_page = 0;
    }

    /// Builder-style [`set_content`](Self::set_content).
    #[must_use]
    pub fn with_content(mut self, content: DisplayContent<W, H>) -> Self {
        self.set_content(content);
        self
    }

    /// Reset the driver board and blank every dot.
    pub async fn setup(&mut self) -> Result<()> {
        info!("max3000: setting up");
        self.driver.begin(true).await?;
        self.driver.clear_display();
        self.driver.display(false).await?;
        info!("max3000: display ready");
        Ok(())
    }

    /// Log the display's configuration.
    pub fn dump_config(&self) {
        let options = &self.options;
        info!(
            "max3000: {}x{} dots, {}x{} panel(s), rotation {}",
            W,
            H,
            options.panels_wide,
            options.panels_high,
            options.rotation.degrees()
        );
        info!(
            "max3000: dissolve {}, auto clear {}, invert {}",
            options.dissolve,
            options.auto_clear,
            options.invert
        );
        info!(
            "max3000: pulse {} us, constant frame rate {}, pages {}",
            options.pulse_duration_us,
            options.constant_frame_rate,
            self.content.page_count()
        );
        match options.update_interval {
            UpdateInterval::Every(period) => {
                info!("max3000: update every {} ms", period.as_millis());
            }
            UpdateInterval::Never => info!("max3000: update only on request"),
        }
    }

    /// Redraw the content and flip whatever changed, playing a queued transition first.
    ///
    /// Returns the number of dots flipped by the final refresh.
    pub async fn update(&mut self) -> Result<usize> {
        let transition = self.next_transition.take();
        let before = transition.map(|_| *self.driver.frame());

        if self.options.auto_clear {
            self.driver.clear_display();
        }
        self.run_writer();

        if let (Some(transition), Some(before)) = (transition, before) {
            let after = *self.driver.frame();
            self.driver.replace_frame(before);
            self.play_transition(transition, &after).await?;
            self.driver.replace_frame(after);
        }

        self.driver.display(false).await
    }

    fn run_writer(&mut self) {
        let writer = match &self.content {
            DisplayContent::Blank => return,
            DisplayContent::Lambda(writer) => *writer,
            DisplayContent::Pages(pages) => match pages.get(self.current_page) {
                Some(page) => page.writer,
                None => return,
            },
        };
        writer(&mut self.driver.canvas());
    }

    async fn play_transition(
        &mut self,
        transition: Transition,
        after: &DotFrame<W, H>,
    ) -> Result<()> {
        let rotation = self.driver.rotation();
        let step_count = transition.step_count(self.driver.width(), self.driver.height());
        let step_delay_ms = u32::try_from(STEP_DELAY.as_millis()).unwrap_or(u32::MAX);
        info!(
            "max3000: transition {} over {} step(s)",
            transition.id(),
            step_count
        );
        for step in 0..step_count {
            transition.apply_step(step, rotation, after, self.driver.frame_mut());
            self.driver.display(false).await?;
            self.driver.delay_ms(step_delay_ms).await;
        }
        Ok(())
    }

    /// Play `transition` before the next update's content appears.
    pub fn transition_on_next_update(&mut self, transition: Transition) {
        self.next_transition = Some(transition);
    }

    /// The transition queued for the next update, if any.
    #[must_use]
    pub const fn pending_transition(&self) -> Option<Transition> {
        self.next_transition
    }

    /// Apply `color` to every dot of the drawing frame.
    pub fn fill(&mut self, color: DotColor) {
        self.driver.canvas().fill(color);
    }

    /// Show page `index` from the next update on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if there is no such page.
    pub fn show_page(&mut self, index: usize) -> Result<()> {
        if index >= self.content.page_count() {
            return Err(Error::IndexOutOfBounds);
        }
        self.current_page = index;
        Ok(())
    }

    /// Advance to the next page, wrapping to the first.
    pub fn show_next_page(&mut self) {
        let page_count = self.content.page_count();
        if page_count > 0 {
            self.current_page = (self.current_page + 1) % page_count;
        }
    }

    /// Go back to the previous page, wrapping to the last.
    pub fn show_previous_page(&mut self) {
        let page_count = self.content.page_count();
        if page_count > 0 {
            self.current_page = (self.current_page + page_count - 1) % page_count;
        }
    }

    /// Id of the page being shown, or `None` for non-paged content.
    #[must_use]
    pub fn current_page(&self) -> Option<&'static str> {
        match &self.content {
            DisplayContent::Pages(pages) => pages.get(self.current_page).map(|page| page.id),
            DisplayContent::Blank | DisplayContent::Lambda(_) => None,
        }
    }

    /// How often the owner should call [`update`](Self::update).
    #[must_use]
    pub const fn update_interval(&self) -> UpdateInterval {
        self.options.update_interval
    }

    /// Logical width after rotation.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.driver.width()
    }

    /// Logical height after rotation.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.driver.height()
    }

    /// The options the display was built with, kept current by [`invert`](Self::invert).
    #[must_use]
    pub const fn options(&self) -> &Max3000Options {
        &self.options
    }

    /// Turn the user LED on panel `board` on or off.
    pub async fn set_user_led(&mut self, board: usize, on: bool) -> Result<()> {
        self.driver.set_user_led(board, on).await
    }

    /// Swap lit and dark faces, refreshing every dot now.
    pub async fn invert(&mut self, invert: bool) -> Result<usize> {
        self.options.invert = invert;
        self.driver.invert_display(invert).await
    }

    /// The underlying driver.
    #[must_use]
    pub const fn driver(&self) -> &Max3000Driver<P, D, W, H> {
        &self.driver
    }

    /// Mutable access to the underlying driver.
    pub const fn driver_mut(&mut self) -> &mut Max3000Driver<P, D, W, H> {
        &mut self.driver
    }
}
