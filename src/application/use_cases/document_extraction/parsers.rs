mod docx;
mod pdf;
mod txt;
