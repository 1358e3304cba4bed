mod collapsible;
mod embeds;
mod image;
