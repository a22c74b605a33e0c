//! Software surfaces and the blitters that move pixels between them.
//!
//! # Example
//!
//! ```
//! use sdlite::video::{blit_surface, PixelFormat, Surface};
//!
//! let mut src = Surface::new(2, 2, PixelFormat::xrgb8888()).unwrap();
//! src.fill_rect(None, 0x00c86432).unwrap();
//! src.set_alpha(Some(128));
//!
//! let mut dst = Surface::new(2, 2, PixelFormat::xrgb8888()).unwrap();
//! blit_surface(&mut src, None, &mut dst, None).unwrap();
//! let c = dst.format().get_rgb(dst.get_pixel(0, 0).unwrap());
//! assert_eq!((c.r, c.g, c.b), (100, 50, 25));
//! ```

pub mod alpha_kernels;
pub mod blit;
pub mod blit_alpha;
pub mod image_io;
pub mod pixels;
pub mod rect;
pub mod stretch;
pub mod surface;

pub use blit::{blit_surface, kernel_cache, lower_blit, Kernel, KernelCache};
pub use blit_alpha::{calculate_alpha_blit, AlphaKernel};
pub use pixels::{Color, Palette, PixelFormat};
pub use rect::Rect;
pub use stretch::soft_stretch;
pub use surface::{LockHandler, Surface, SurfaceFlags, SurfaceId};
