mod layout;
mod view;
