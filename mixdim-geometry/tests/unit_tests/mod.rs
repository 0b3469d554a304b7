mod procedural;
