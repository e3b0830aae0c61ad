//! Very simple functions for producing KML files of clustering output.
//!
//! Only the handful of elements needed to look at the emitted rows in a map viewer are supported.
//! The API is streaming, so the user is responsible for closing all tags.

use crate::{reduce::SpawnRow, SpawnResult};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

const ROW_STYLE: &str = "spawn";

pub struct KmlFile(BufWriter<File>);

impl KmlFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> SpawnResult<Self> {
        let p = pth.as_ref();

        let f = std::fs::File::create(p)?;
        let mut new = KmlFile(BufWriter::new(f));
        new.start_document()?;
        Ok(new)
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        self.finish_document();
    }
}

/// Write the rows to a new KML file at `pth`.
pub fn save_kml<P: AsRef<Path>>(rows: &[SpawnRow], pth: P) -> SpawnResult<()> {
    let mut kml = KmlFile::new(pth)?;
    kml.write_spawn_rows(rows)?;
    Ok(())
}

pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Put the header out.
    fn start_document(&mut self) -> SpawnResult<()> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        self.output().write_all(HEADER.as_bytes())?;

        Ok(())
    }

    /// Close a document.
    fn finish_document(&mut self) {
        const FOOTER: &str = concat!(r#"</Document>"#, "\n", r#"</kml>"#, "\n");
        let _ = self.output().write_all(FOOTER.as_bytes());
        let _ = self.output().flush();
    }

    /// Write a description element to the file.
    fn write_description(&mut self, description: &str) -> SpawnResult<()> {
        writeln!(
            self.output(),
            "<description><![CDATA[{}]]></description>",
            description
        )?;
        Ok(())
    }

    /// Start a KML folder.
    fn start_folder(&mut self, name: Option<&str>, is_open: bool) -> SpawnResult<()> {
        self.output().write_all("<Folder>\n".as_bytes())?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", escape(name))?;
        }

        if is_open {
            self.output().write_all("<open>1</open>\n".as_bytes())?;
        }

        Ok(())
    }

    /// Close out a folder element
    fn finish_folder(&mut self) -> SpawnResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    /// Start a placemark element.
    fn start_placemark(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        style_url: Option<&str>,
    ) -> SpawnResult<()> {
        writeln!(self.output(), "<Placemark>")?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", escape(name))?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if let Some(style_url) = style_url {
            writeln!(self.output(), "<styleUrl>{}</styleUrl>", style_url)?;
        }

        Ok(())
    }

    /// Close out a placemark element.
    fn finish_placemark(&mut self) -> SpawnResult<()> {
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    /// Define a style with only an icon.
    fn create_icon_style(
        &mut self,
        style_id: &str,
        icon_url: Option<&str>,
        scale: f64,
    ) -> SpawnResult<()> {
        writeln!(self.output(), "<Style id=\"{}\">", style_id)?;
        writeln!(self.output(), "<IconStyle>")?;

        if scale > 0.0 {
            writeln!(self.output(), "<scale>{}</scale>", scale)?;
        } else {
            writeln!(self.output(), "<scale>1</scale>")?;
        }

        if let Some(icon_url) = icon_url {
            writeln!(self.output(), "<Icon><href>{}</href></Icon>", icon_url)?;
        }

        writeln!(self.output(), "</IconStyle>")?;
        writeln!(self.output(), "</Style>")?;
        Ok(())
    }

    /// Write out a KML Point element
    fn create_point(&mut self, lat: f64, lon: f64, z: f64) -> SpawnResult<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},{}</coordinates>\n</Point>",
            lon,
            lat,
            z
        )?;
        Ok(())
    }

    /// Write a folder with one placemark per row.
    fn write_spawn_rows(&mut self, rows: &[SpawnRow]) -> SpawnResult<()> {
        self.create_icon_style(
            ROW_STYLE,
            Some("http://maps.google.com/mapfiles/kml/shapes/placemark_circle.png"),
            0.8,
        )?;
        self.start_folder(Some("Spawn clusters"), true)?;

        for row in rows {
            let name = format!(
                "{:02}:{:02}",
                row.time.div_euclid(60),
                row.time.rem_euclid(60)
            );
            let description = format!(
                "id: {}<br/>time: {} s<br/>lat: {:.6}<br/>lng: {:.6}",
                row.id.as_deref().unwrap_or("none"),
                row.time,
                row.lat,
                row.lng
            );

            self.start_placemark(
                Some(&name),
                Some(&description),
                Some(&format!("#{}", ROW_STYLE)),
            )?;
            self.create_point(row.lat, row.lng, 0.0)?;
            self.finish_placemark()?;
        }

        self.finish_folder()?;
        Ok(())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
